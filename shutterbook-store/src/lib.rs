pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod memory;
pub mod session_repo;
pub mod slot_repo;
pub mod waitlist_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use memory::MemoryStore;
pub use session_repo::PgSessionRepository;
pub use slot_repo::PgSlotRepository;
pub use waitlist_repo::PgWaitlistRepository;

use shutterbook_domain::EngineError;

/// sqlx errors surface as opaque storage errors; the typed taxonomy is
/// reserved for outcomes the caller can act on.
pub(crate) fn db_err(e: sqlx::Error) -> EngineError {
    EngineError::Storage(e.to_string())
}
