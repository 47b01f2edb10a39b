use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, NewBooking};
use crate::error::EngineError;
use crate::session::{MiniSession, SessionDate};
use crate::slot::Slot;
use crate::waitlist::WaitlistEntry;

/// Expected prior slot state for a confirm's conditional write.
#[derive(Debug, Clone)]
pub enum BookGuard {
    /// Slot must be held by this contact with an unexpired hold.
    HeldBy(String),
    /// Auto-confirm bypass: slot must be available (a stale hold counts).
    AutoConfirm,
}

/// Repository for MiniSession/SessionDate rows. Plain persistence; the
/// concurrency obligations live on the slot side.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: MiniSession) -> Result<MiniSession, EngineError>;
    async fn get_session(&self, id: Uuid) -> Result<MiniSession, EngineError>;
    async fn create_date(&self, date: SessionDate) -> Result<SessionDate, EngineError>;
    async fn get_date(&self, id: Uuid) -> Result<SessionDate, EngineError>;
}

/// Repository for slot rows. Every status transition is an atomic
/// conditional write: the `try_*` methods succeed only when the row
/// still matches the expected prior state, and concurrent callers for
/// the same slot are serialized by the backing store, never by
/// in-process locks held across processes.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    async fn get(&self, slot_id: Uuid) -> Result<Slot, EngineError>;

    /// Slots open to a new booker as of `as_of`: `available`, plus holds
    /// already past expiry (treated as available before the sweeper
    /// runs). Ordered by start time.
    async fn list_available(
        &self,
        session_date_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Slot>, EngineError>;

    /// Insert generated slots for a date. Idempotent per date: when the
    /// date already has slots the call inserts nothing and reports 0.
    async fn insert_slots(&self, slots: Vec<Slot>) -> Result<usize, EngineError>;

    /// CAS: available (or stale-held) -> held by `contact` until
    /// `held_until`. Loses cleanly with `SlotUnavailable` on contention.
    async fn try_hold(
        &self,
        slot_id: Uuid,
        contact: &str,
        held_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Slot, EngineError>;

    /// CAS: extend a live hold owned by `contact`.
    async fn try_renew(
        &self,
        slot_id: Uuid,
        contact: &str,
        held_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Slot, EngineError>;

    /// Voluntary release. Idempotent: returns None when the slot is not
    /// currently held by `contact`.
    async fn try_release(
        &self,
        slot_id: Uuid,
        contact: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Slot>, EngineError>;

    /// Holds whose expiry has passed, for the sweeper.
    async fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Slot>, EngineError>;

    /// CAS keyed on the exact expiry the sweeper observed, so a hold
    /// renewed between the sweeper's read and write is not clobbered.
    /// Returns false when the row no longer matches.
    async fn try_reclaim(
        &self,
        slot_id: Uuid,
        observed_held_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, EngineError>;
}

/// Repository for booking rows. `confirm` owns the one transaction that
/// upholds at-most-one-booking-per-slot: the slot transition to `booked`
/// and the booking insert commit together or not at all.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn confirm(
        &self,
        booking: NewBooking,
        guard: BookGuard,
        now: DateTime<Utc>,
    ) -> Result<Booking, EngineError>;

    async fn get(&self, booking_id: Uuid) -> Result<Booking, EngineError>;

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Booking>, EngineError>;

    /// Booking -> cancelled (kept for audit) and slot -> available, in
    /// one transaction. Returns the cancelled booking and the released
    /// slot.
    async fn cancel(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Booking, Slot), EngineError>;
}

/// Repository for waitlist entries. Entries are owned by the
/// coordinator and mutated only through it.
#[async_trait]
pub trait WaitlistRepository: Send + Sync {
    async fn insert(&self, entry: WaitlistEntry) -> Result<WaitlistEntry, EngineError>;

    async fn get(&self, entry_id: Uuid) -> Result<WaitlistEntry, EngineError>;

    /// `waiting` entries matching a date of the session: scoped entries
    /// for that date plus session-wide entries. FIFO by created_at,
    /// tie-broken by id.
    async fn waiting_for_date(
        &self,
        mini_session_id: Uuid,
        session_date_id: Uuid,
    ) -> Result<Vec<WaitlistEntry>, EngineError>;

    /// CAS: waiting -> notified. False when the entry already moved on.
    async fn mark_notified(&self, entry_id: Uuid, now: DateTime<Utc>) -> Result<bool, EngineError>;

    /// CAS: notified -> expired (promotional hold lapsed unconverted).
    async fn mark_expired(&self, entry_id: Uuid) -> Result<bool, EngineError>;

    /// CAS: notified -> converted, recording the booking that closed it.
    async fn mark_converted(
        &self,
        entry_id: Uuid,
        booking_id: Uuid,
    ) -> Result<bool, EngineError>;

    /// The `notified` entry (if any) whose promotional hold a given
    /// contact carries for a date of this session.
    async fn find_notified(
        &self,
        mini_session_id: Uuid,
        session_date_id: Uuid,
        contact: &str,
    ) -> Result<Option<WaitlistEntry>, EngineError>;
}
