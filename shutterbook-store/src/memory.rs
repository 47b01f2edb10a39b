use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shutterbook_domain::{
    BookGuard, Booking, BookingRepository, BookingStatus, EngineError, MiniSession, NewBooking,
    SessionDate, SessionRepository, Slot, SlotRepository, SlotStatus, WaitlistEntry,
    WaitlistRepository, WaitlistStatus,
};

#[derive(Default)]
struct Inner {
    sessions: HashMap<Uuid, MiniSession>,
    dates: HashMap<Uuid, SessionDate>,
    slots: HashMap<Uuid, Slot>,
    bookings: HashMap<Uuid, Booking>,
    waitlist: HashMap<Uuid, WaitlistEntry>,
}

/// In-memory store used by tests and local development. One mutex
/// serializes all mutations, and every transition re-checks the
/// expected prior state under that lock — the same conditional-write
/// discipline the Postgres repositories express in SQL.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create_session(&self, session: MiniSession) -> Result<MiniSession, EngineError> {
        self.lock().sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> Result<MiniSession, EngineError> {
        self.lock()
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("mini_session", id))
    }

    async fn create_date(&self, date: SessionDate) -> Result<SessionDate, EngineError> {
        self.lock().dates.insert(date.id, date.clone());
        Ok(date)
    }

    async fn get_date(&self, id: Uuid) -> Result<SessionDate, EngineError> {
        self.lock()
            .dates
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("session_date", id))
    }
}

#[async_trait]
impl SlotRepository for MemoryStore {
    async fn get(&self, slot_id: Uuid) -> Result<Slot, EngineError> {
        self.lock()
            .slots
            .get(&slot_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("slot", slot_id))
    }

    async fn list_available(
        &self,
        session_date_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Slot>, EngineError> {
        let guard = self.lock();
        let mut open: Vec<Slot> = guard
            .slots
            .values()
            .filter(|s| s.session_date_id == session_date_id)
            .filter(|s| {
                s.status == SlotStatus::Available
                    || (s.status == SlotStatus::Held
                        && s.held_until.map_or(false, |t| t < as_of))
            })
            .cloned()
            .collect();
        open.sort_by(|a, b| a.start_at.cmp(&b.start_at).then(a.id.cmp(&b.id)));
        Ok(open)
    }

    async fn insert_slots(&self, slots: Vec<Slot>) -> Result<usize, EngineError> {
        let Some(date_id) = slots.first().map(|s| s.session_date_id) else {
            return Ok(0);
        };
        let mut guard = self.lock();
        // Idempotent per date: a date that already has slots gets none.
        if guard.slots.values().any(|s| s.session_date_id == date_id) {
            return Ok(0);
        }
        let inserted = slots.len();
        for slot in slots {
            guard.slots.insert(slot.id, slot);
        }
        Ok(inserted)
    }

    async fn try_hold(
        &self,
        slot_id: Uuid,
        contact: &str,
        held_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Slot, EngineError> {
        let mut guard = self.lock();
        let slot = guard
            .slots
            .get_mut(&slot_id)
            .ok_or_else(|| EngineError::not_found("slot", slot_id))?;

        if !slot.holdable(now) {
            return Err(slot.deny_hold());
        }
        slot.status = SlotStatus::Held;
        slot.held_by = Some(contact.to_string());
        slot.held_until = Some(held_until);
        slot.updated_at = now;
        Ok(slot.clone())
    }

    async fn try_renew(
        &self,
        slot_id: Uuid,
        contact: &str,
        held_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Slot, EngineError> {
        let mut guard = self.lock();
        let slot = guard
            .slots
            .get_mut(&slot_id)
            .ok_or_else(|| EngineError::not_found("slot", slot_id))?;

        if !slot.held_live_by(contact, now) {
            return Err(slot.deny_renew(contact, now));
        }
        slot.held_until = Some(held_until);
        slot.updated_at = now;
        Ok(slot.clone())
    }

    async fn try_release(
        &self,
        slot_id: Uuid,
        contact: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Slot>, EngineError> {
        let mut guard = self.lock();
        let Some(slot) = guard.slots.get_mut(&slot_id) else {
            return Ok(None);
        };
        if slot.status != SlotStatus::Held || slot.held_by.as_deref() != Some(contact) {
            return Ok(None);
        }
        slot.status = SlotStatus::Available;
        slot.held_by = None;
        slot.held_until = None;
        slot.updated_at = now;
        Ok(Some(slot.clone()))
    }

    async fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Slot>, EngineError> {
        let guard = self.lock();
        let mut expired: Vec<Slot> = guard
            .slots
            .values()
            .filter(|s| s.status == SlotStatus::Held && s.held_until.map_or(false, |t| t < now))
            .cloned()
            .collect();
        expired.sort_by_key(|s| s.held_until);
        Ok(expired)
    }

    async fn try_reclaim(
        &self,
        slot_id: Uuid,
        observed_held_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        let mut guard = self.lock();
        let Some(slot) = guard.slots.get_mut(&slot_id) else {
            return Ok(false);
        };
        if slot.status != SlotStatus::Held || slot.held_until != Some(observed_held_until) {
            return Ok(false);
        }
        slot.status = SlotStatus::Available;
        slot.held_by = None;
        slot.held_until = None;
        slot.updated_at = now;
        Ok(true)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn confirm(
        &self,
        booking: NewBooking,
        guard_kind: BookGuard,
        now: DateTime<Utc>,
    ) -> Result<Booking, EngineError> {
        let mut guard = self.lock();
        let slot = guard
            .slots
            .get_mut(&booking.slot_id)
            .ok_or_else(|| EngineError::not_found("slot", booking.slot_id))?;

        match &guard_kind {
            BookGuard::HeldBy(contact) => {
                if !slot.held_live_by(contact, now) {
                    return Err(slot.deny_confirm(contact, now));
                }
            }
            BookGuard::AutoConfirm => {
                if !slot.holdable(now) {
                    return Err(slot.deny_hold());
                }
            }
        }

        slot.status = SlotStatus::Booked;
        slot.booking_id = Some(booking.id);
        slot.held_by = None;
        slot.held_until = None;
        slot.updated_at = now;

        let persisted = booking.into_booking(now);
        guard.bookings.insert(persisted.id, persisted.clone());
        Ok(persisted)
    }

    async fn get(&self, booking_id: Uuid) -> Result<Booking, EngineError> {
        self.lock()
            .bookings
            .get(&booking_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("booking", booking_id))
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Booking>, EngineError> {
        Ok(self
            .lock()
            .bookings
            .values()
            .find(|b| b.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn cancel(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Booking, Slot), EngineError> {
        let mut guard = self.lock();
        let booking = guard
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| EngineError::not_found("booking", booking_id))?;
        if booking.status != BookingStatus::Confirmed {
            return Err(EngineError::Validation {
                field: "booking_id",
                reason: "booking is already cancelled".into(),
            });
        }
        booking.status = BookingStatus::Cancelled;
        booking.updated_at = now;
        let booking = booking.clone();

        let slot = guard
            .slots
            .get_mut(&booking.slot_id)
            .ok_or_else(|| EngineError::not_found("slot", booking.slot_id))?;
        if slot.status != SlotStatus::Booked || slot.booking_id != Some(booking_id) {
            return Err(EngineError::Storage(format!(
                "slot {} out of sync with booking {}",
                booking.slot_id, booking_id
            )));
        }
        slot.status = SlotStatus::Available;
        slot.booking_id = None;
        slot.updated_at = now;
        let slot = slot.clone();

        Ok((booking, slot))
    }
}

#[async_trait]
impl WaitlistRepository for MemoryStore {
    async fn insert(&self, entry: WaitlistEntry) -> Result<WaitlistEntry, EngineError> {
        self.lock().waitlist.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get(&self, entry_id: Uuid) -> Result<WaitlistEntry, EngineError> {
        self.lock()
            .waitlist
            .get(&entry_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("waitlist_entry", entry_id))
    }

    async fn waiting_for_date(
        &self,
        mini_session_id: Uuid,
        session_date_id: Uuid,
    ) -> Result<Vec<WaitlistEntry>, EngineError> {
        let guard = self.lock();
        let mut waiting: Vec<WaitlistEntry> = guard
            .waitlist
            .values()
            .filter(|e| e.mini_session_id == mini_session_id)
            .filter(|e| e.status == WaitlistStatus::Waiting)
            .filter(|e| e.session_date_id.map_or(true, |d| d == session_date_id))
            .cloned()
            .collect();
        waiting.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(waiting)
    }

    async fn mark_notified(&self, entry_id: Uuid, now: DateTime<Utc>) -> Result<bool, EngineError> {
        let mut guard = self.lock();
        let Some(entry) = guard.waitlist.get_mut(&entry_id) else {
            return Ok(false);
        };
        if entry.status != WaitlistStatus::Waiting {
            return Ok(false);
        }
        entry.status = WaitlistStatus::Notified;
        entry.notified_at = Some(now);
        Ok(true)
    }

    async fn mark_expired(&self, entry_id: Uuid) -> Result<bool, EngineError> {
        let mut guard = self.lock();
        let Some(entry) = guard.waitlist.get_mut(&entry_id) else {
            return Ok(false);
        };
        if entry.status != WaitlistStatus::Notified {
            return Ok(false);
        }
        entry.status = WaitlistStatus::Expired;
        Ok(true)
    }

    async fn mark_converted(
        &self,
        entry_id: Uuid,
        booking_id: Uuid,
    ) -> Result<bool, EngineError> {
        let mut guard = self.lock();
        let Some(entry) = guard.waitlist.get_mut(&entry_id) else {
            return Ok(false);
        };
        if entry.status != WaitlistStatus::Notified {
            return Ok(false);
        }
        entry.status = WaitlistStatus::Converted;
        entry.converted_booking_id = Some(booking_id);
        Ok(true)
    }

    async fn find_notified(
        &self,
        mini_session_id: Uuid,
        session_date_id: Uuid,
        contact: &str,
    ) -> Result<Option<WaitlistEntry>, EngineError> {
        let guard = self.lock();
        let mut notified: Vec<&WaitlistEntry> = guard
            .waitlist
            .values()
            .filter(|e| e.mini_session_id == mini_session_id)
            .filter(|e| e.status == WaitlistStatus::Notified)
            .filter(|e| e.contact_email == contact)
            .filter(|e| e.session_date_id.map_or(true, |d| d == session_date_id))
            .collect();
        notified.sort_by_key(|e| e.notified_at);
        Ok(notified.first().map(|e| (*e).clone()))
    }
}
