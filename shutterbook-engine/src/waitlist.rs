use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use shutterbook_domain::{
    EngineError, Notifier, SessionRepository, Slot, SlotRepository, WaitlistEntry,
    WaitlistRepository, WaitlistStatus,
};
use uuid::Uuid;

/// Records standby demand and promotes the next waiting entry when
/// capacity frees up. First come, first served: promotion order is
/// entry creation time, tie-broken by id.
pub struct WaitlistCoordinator {
    slots: Arc<dyn SlotRepository>,
    sessions: Arc<dyn SessionRepository>,
    waitlist: Arc<dyn WaitlistRepository>,
    notifier: Arc<dyn Notifier>,
    default_ttl_minutes: i64,
}

impl WaitlistCoordinator {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        sessions: Arc<dyn SessionRepository>,
        waitlist: Arc<dyn WaitlistRepository>,
        notifier: Arc<dyn Notifier>,
        default_ttl_minutes: i64,
    ) -> Self {
        Self {
            slots,
            sessions,
            waitlist,
            notifier,
            default_ttl_minutes,
        }
    }

    /// Join the waitlist for a session, optionally scoped to one date.
    pub async fn join(
        &self,
        mini_session_id: Uuid,
        session_date_id: Option<Uuid>,
        contact_email: String,
        contact_name: Option<String>,
        preferred_times: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<WaitlistEntry, EngineError> {
        let session = self.sessions.get_session(mini_session_id).await?;
        if !session.allow_waitlist {
            return Err(EngineError::WaitlistClosed {
                session_id: mini_session_id,
            });
        }
        if let Some(date_id) = session_date_id {
            let date = self.sessions.get_date(date_id).await?;
            if date.mini_session_id != mini_session_id {
                return Err(EngineError::Validation {
                    field: "session_date_id",
                    reason: "date belongs to a different session".into(),
                });
            }
        }

        let entry = WaitlistEntry {
            id: Uuid::new_v4(),
            mini_session_id,
            session_date_id,
            contact_email,
            contact_name,
            preferred_times,
            status: WaitlistStatus::Waiting,
            notified_at: None,
            converted_booking_id: None,
            created_at: now,
        };
        self.waitlist.insert(entry).await
    }

    /// Called on every release of a held or booked slot. Promotes the
    /// earliest-created matching `waiting` entry: the entry is granted a
    /// promotional hold with the standard TTL (the same grace window as
    /// a fresh booker) and marked `notified`. Returns the promoted entry
    /// or None when the slot simply stays available.
    ///
    /// The candidate loop is bounded by the number of `waiting` entries,
    /// so a permanently unfillable slot cannot loop forever.
    pub async fn on_slot_released(
        &self,
        slot: &Slot,
        now: DateTime<Utc>,
    ) -> Result<Option<WaitlistEntry>, EngineError> {
        let date = self.sessions.get_date(slot.session_date_id).await?;
        let session = self.sessions.get_session(date.mini_session_id).await?;
        if !session.allow_waitlist {
            return Ok(None);
        }

        let ttl = Duration::minutes(session.hold_ttl_minutes(self.default_ttl_minutes));
        let candidates = self
            .waitlist
            .waiting_for_date(session.id, date.id)
            .await?;

        for entry in candidates {
            if !entry.matches_slot_time(slot) {
                continue;
            }

            // Hold first, then flip the entry: a promotion must never
            // leave a notified entry without the slot it was promised.
            match self
                .slots
                .try_hold(slot.id, &entry.contact_email, now + ttl, now)
                .await
            {
                Ok(held) => {
                    if self.waitlist.mark_notified(entry.id, now).await? {
                        tracing::info!(
                            entry_id = %entry.id,
                            slot_id = %slot.id,
                            contact = %entry.contact_email,
                            "waitlist entry promoted"
                        );
                        self.notifier.waitlist_promoted(&entry, &held).await;
                        return Ok(Some(entry));
                    }
                    // The entry moved on concurrently; free the slot for
                    // the next candidate.
                    self.slots
                        .try_release(slot.id, &entry.contact_email, now)
                        .await?;
                }
                Err(EngineError::SlotUnavailable { .. }) => {
                    // A live booker grabbed the slot between release and
                    // promotion; nothing left to promote into.
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    /// A lapsed promotional hold: the notified entry expires, then the
    /// slot goes through promotion again for the next in line.
    pub async fn on_promotion_lapsed(
        &self,
        slot: &Slot,
        lapsed_contact: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<WaitlistEntry>, EngineError> {
        let date = self.sessions.get_date(slot.session_date_id).await?;
        if let Some(entry) = self
            .waitlist
            .find_notified(date.mini_session_id, date.id, lapsed_contact)
            .await?
        {
            if self.waitlist.mark_expired(entry.id).await? {
                tracing::info!(entry_id = %entry.id, slot_id = %slot.id, "waitlist promotion expired unconverted");
            }
        }
        self.on_slot_released(slot, now).await
    }

    /// Close the loop when a promoted visitor completes confirmation.
    pub async fn convert(
        &self,
        entry_id: Uuid,
        booking_id: Uuid,
    ) -> Result<bool, EngineError> {
        let flipped = self.waitlist.mark_converted(entry_id, booking_id).await?;
        if flipped {
            tracing::info!(%entry_id, %booking_id, "waitlist entry converted");
        }
        Ok(flipped)
    }

    /// Locate the notified entry behind a confirming contact, if the
    /// confirmation closes out a promotion.
    pub async fn notified_entry_for(
        &self,
        slot: &Slot,
        contact: &str,
    ) -> Result<Option<WaitlistEntry>, EngineError> {
        let date = self.sessions.get_date(slot.session_date_id).await?;
        self.waitlist
            .find_notified(date.mini_session_id, date.id, contact)
            .await
    }
}
