use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use shutterbook_domain::{
    EngineError, MiniSession, SessionDate, SessionRepository, Slot, SlotRepository, SlotStatus,
};
use uuid::Uuid;

/// Divide a date's window into fixed-length intervals of
/// `duration + buffer` minutes, emitting `capacity_per_slot` rows per
/// interval. A partial final interval is not emitted.
pub fn build_slots(session: &MiniSession, date: &SessionDate, now: DateTime<Utc>) -> Vec<Slot> {
    let duration = Duration::minutes(i64::from(session.duration_minutes));
    let step = duration + Duration::minutes(i64::from(session.buffer_minutes));
    let capacity = session.capacity_per_slot.max(1);

    let mut slots = Vec::new();
    let mut cursor = date.start_at;
    while cursor + duration <= date.end_at {
        for _ in 0..capacity {
            slots.push(Slot {
                id: Uuid::new_v4(),
                session_date_id: date.id,
                start_at: cursor,
                end_at: cursor + duration,
                status: SlotStatus::Available,
                booking_id: None,
                held_until: None,
                held_by: None,
                created_at: now,
                updated_at: now,
            });
        }
        cursor += step;
    }
    slots
}

/// Generates and persists the slots for a newly scheduled date.
pub struct SlotGenerator {
    sessions: Arc<dyn SessionRepository>,
    slots: Arc<dyn SlotRepository>,
}

impl SlotGenerator {
    pub fn new(sessions: Arc<dyn SessionRepository>, slots: Arc<dyn SlotRepository>) -> Self {
        Self { sessions, slots }
    }

    /// Generation is idempotent per date: re-running against a date that
    /// already has slots inserts nothing.
    pub async fn generate(&self, date_id: Uuid, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let date = self.sessions.get_date(date_id).await?;
        let session = self.sessions.get_session(date.mini_session_id).await?;

        if date.end_at <= date.start_at {
            return Err(EngineError::Validation {
                field: "end_at",
                reason: "date window ends before it starts".into(),
            });
        }

        let generated = build_slots(&session, &date, now);
        let inserted = self.slots.insert_slots(generated).await?;
        if inserted > 0 {
            tracing::info!(%date_id, inserted, "generated slots for session date");
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(duration: i32, buffer: i32, capacity: i32) -> MiniSession {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        MiniSession {
            id: Uuid::new_v4(),
            owner_id: "owner-1".into(),
            name: "Golden hour minis".into(),
            description: None,
            duration_minutes: duration,
            buffer_minutes: buffer,
            price: 15000,
            deposit_amount: 5000,
            currency: "USD".into(),
            capacity_per_slot: capacity,
            allow_waitlist: true,
            auto_confirm: false,
            published: true,
            hold_ttl_minutes: None,
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn date_window(session_id: Uuid, start_h: u32, end_h: u32) -> SessionDate {
        SessionDate {
            id: Uuid::new_v4(),
            mini_session_id: session_id,
            start_at: Utc.with_ymd_and_hms(2025, 6, 7, start_h, 0, 0).unwrap(),
            end_at: Utc.with_ymd_and_hms(2025, 6, 7, end_h, 0, 0).unwrap(),
            location_override: None,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn splits_window_into_duration_plus_buffer_steps() {
        let s = session(20, 10, 1);
        let d = date_window(s.id, 9, 11);
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 0, 0, 0).unwrap();

        // 09:00-11:00 with 30-minute steps: 09:00, 09:30, 10:00, 10:30.
        let slots = build_slots(&s, &d, now);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].start_at, d.start_at);
        assert_eq!(slots[0].end_at, d.start_at + Duration::minutes(20));
        assert_eq!(slots[3].start_at, d.start_at + Duration::minutes(90));
    }

    #[test]
    fn partial_final_interval_is_dropped() {
        let s = session(45, 0, 1);
        let d = date_window(s.id, 9, 11);
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 0, 0, 0).unwrap();

        // 120 minutes / 45 = two full slots; the trailing 30 minutes
        // cannot fit a session.
        let slots = build_slots(&s, &d, now);
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn capacity_emits_parallel_rows_per_interval() {
        let s = session(30, 0, 3);
        let d = date_window(s.id, 9, 10);
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 0, 0, 0).unwrap();

        let slots = build_slots(&s, &d, now);
        assert_eq!(slots.len(), 6);
        assert_eq!(
            slots.iter().filter(|sl| sl.start_at == d.start_at).count(),
            3
        );
    }
}
