pub mod booking;
pub mod error;
pub mod notify;
pub mod payment;
pub mod repository;
pub mod session;
pub mod slot;
pub mod waitlist;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use error::EngineError;
pub use notify::{NoopNotifier, Notifier};
pub use payment::{ChargeRequest, PaymentProvider, PaymentResult, PaymentStatus};
pub use repository::{
    BookGuard, BookingRepository, SessionRepository, SlotRepository, WaitlistRepository,
};
pub use session::{MiniSession, SessionDate};
pub use slot::{Slot, SlotStatus};
pub use waitlist::{WaitlistEntry, WaitlistStatus};
