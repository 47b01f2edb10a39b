use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use shutterbook_domain::{EngineError, SessionRepository, Slot, SlotRepository};
use uuid::Uuid;

/// Grants, renews, and releases temporary reservations ahead of
/// payment. All transitions go through the repository's conditional
/// writes; this service only resolves the TTL and sequences the calls.
pub struct HoldManager {
    slots: Arc<dyn SlotRepository>,
    sessions: Arc<dyn SessionRepository>,
    default_ttl_minutes: i64,
}

impl HoldManager {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        sessions: Arc<dyn SessionRepository>,
        default_ttl_minutes: i64,
    ) -> Self {
        Self {
            slots,
            sessions,
            default_ttl_minutes,
        }
    }

    /// TTL for a hold on the given slot, honoring the per-session
    /// override.
    pub async fn hold_ttl(&self, slot: &Slot) -> Result<Duration, EngineError> {
        let date = self.sessions.get_date(slot.session_date_id).await?;
        let session = self.sessions.get_session(date.mini_session_id).await?;
        Ok(Duration::minutes(
            session.hold_ttl_minutes(self.default_ttl_minutes),
        ))
    }

    /// Place a hold. Succeeds when the slot is available or carries a
    /// stale hold (the caller steals it); a live hold or a booking loses
    /// with `SlotUnavailable`.
    pub async fn place_hold(
        &self,
        slot_id: Uuid,
        contact: &str,
        now: DateTime<Utc>,
    ) -> Result<Slot, EngineError> {
        let slot = self.slots.get(slot_id).await?;
        let ttl = self.hold_ttl(&slot).await?;

        let held = self.slots.try_hold(slot_id, contact, now + ttl, now).await?;
        tracing::info!(%slot_id, contact, held_until = %held.held_until.unwrap_or(now), "hold placed");
        Ok(held)
    }

    /// Extend a live hold. Wrong holder fails with `HoldMismatch`; a
    /// lapsed hold cannot be renewed, only re-placed.
    pub async fn renew_hold(
        &self,
        slot_id: Uuid,
        contact: &str,
        now: DateTime<Utc>,
    ) -> Result<Slot, EngineError> {
        let slot = self.slots.get(slot_id).await?;
        let ttl = self.hold_ttl(&slot).await?;

        let renewed = self
            .slots
            .try_renew(slot_id, contact, now + ttl, now)
            .await?;
        tracing::debug!(%slot_id, contact, "hold renewed");
        Ok(renewed)
    }

    /// Voluntary release. Idempotent: releasing a slot not held by this
    /// contact is a no-op and returns None. On a real release the caller
    /// is expected to run the waitlist check.
    pub async fn release_hold(
        &self,
        slot_id: Uuid,
        contact: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Slot>, EngineError> {
        let released = self.slots.try_release(slot_id, contact, now).await?;
        if released.is_some() {
            tracing::info!(%slot_id, contact, "hold released");
        }
        Ok(released)
    }
}
