use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Held,
    Booked,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Held => "held",
            SlotStatus::Booked => "booked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(SlotStatus::Available),
            "held" => Some(SlotStatus::Held),
            "booked" => Some(SlotStatus::Booked),
            _ => None,
        }
    }
}

/// The atomic reservable unit. Exactly one row exists per bookable
/// interval; `held_until`/`held_by` are populated iff status is `held`,
/// `booking_id` iff status is `booked`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub session_date_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: SlotStatus,
    pub booking_id: Option<Uuid>,
    pub held_until: Option<DateTime<Utc>>,
    pub held_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    /// A hold whose expiry has passed. Stale holds read as available
    /// even before the sweeper reclaims them.
    pub fn hold_is_stale(&self, now: DateTime<Utc>) -> bool {
        self.status == SlotStatus::Held && self.held_until.map_or(true, |t| t <= now)
    }

    /// Whether a new hold may be placed as of `now`.
    pub fn holdable(&self, now: DateTime<Utc>) -> bool {
        self.status == SlotStatus::Available || self.hold_is_stale(now)
    }

    /// Whether `contact` currently owns a live hold on this slot.
    pub fn held_live_by(&self, contact: &str, now: DateTime<Utc>) -> bool {
        self.status == SlotStatus::Held
            && !self.hold_is_stale(now)
            && self.held_by.as_deref() == Some(contact)
    }

    /// Classify why a hold attempt lost the race.
    pub fn deny_hold(&self) -> EngineError {
        EngineError::SlotUnavailable { slot_id: self.id }
    }

    /// Classify why a renew attempt failed.
    pub fn deny_renew(&self, contact: &str, now: DateTime<Utc>) -> EngineError {
        match self.status {
            SlotStatus::Booked => EngineError::SlotUnavailable { slot_id: self.id },
            SlotStatus::Held => {
                if self.held_by.as_deref() != Some(contact) {
                    EngineError::HoldMismatch { slot_id: self.id }
                } else if self.hold_is_stale(now) {
                    EngineError::ExpiredHold { slot_id: self.id }
                } else {
                    EngineError::SlotUnavailable { slot_id: self.id }
                }
            }
            SlotStatus::Available => EngineError::ExpiredHold { slot_id: self.id },
        }
    }

    /// Classify why a confirm attempt failed its conditional write.
    pub fn deny_confirm(&self, contact: &str, now: DateTime<Utc>) -> EngineError {
        match self.status {
            SlotStatus::Booked => EngineError::SlotUnavailable { slot_id: self.id },
            SlotStatus::Held => {
                if self.held_by.as_deref() == Some(contact) && self.hold_is_stale(now) {
                    EngineError::ExpiredHold { slot_id: self.id }
                } else if self.held_by.as_deref() != Some(contact) {
                    EngineError::HoldMismatch { slot_id: self.id }
                } else {
                    EngineError::SlotUnavailable { slot_id: self.id }
                }
            }
            // The hold lapsed and was reclaimed before the confirm landed.
            SlotStatus::Available => EngineError::ExpiredHold { slot_id: self.id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn slot_at(status: SlotStatus, held_by: Option<&str>, held_until: Option<DateTime<Utc>>) -> Slot {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        Slot {
            id: Uuid::new_v4(),
            session_date_id: Uuid::new_v4(),
            start_at: t0,
            end_at: t0 + Duration::minutes(30),
            status,
            booking_id: None,
            held_until,
            held_by: held_by.map(String::from),
            created_at: t0,
            updated_at: t0,
        }
    }

    #[test]
    fn stale_hold_reads_as_holdable() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let stale = slot_at(
            SlotStatus::Held,
            Some("a@example.com"),
            Some(now - Duration::minutes(1)),
        );
        assert!(stale.hold_is_stale(now));
        assert!(stale.holdable(now));

        let live = slot_at(
            SlotStatus::Held,
            Some("a@example.com"),
            Some(now + Duration::minutes(5)),
        );
        assert!(!live.hold_is_stale(now));
        assert!(!live.holdable(now));
    }

    #[test]
    fn confirm_denial_classification() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();

        let expired = slot_at(
            SlotStatus::Held,
            Some("a@example.com"),
            Some(now - Duration::minutes(2)),
        );
        assert!(matches!(
            expired.deny_confirm("a@example.com", now),
            EngineError::ExpiredHold { .. }
        ));

        let foreign = slot_at(
            SlotStatus::Held,
            Some("b@example.com"),
            Some(now + Duration::minutes(5)),
        );
        assert!(matches!(
            foreign.deny_confirm("a@example.com", now),
            EngineError::HoldMismatch { .. }
        ));

        let booked = slot_at(SlotStatus::Booked, None, None);
        assert!(matches!(
            booked.deny_confirm("a@example.com", now),
            EngineError::SlotUnavailable { .. }
        ));
    }
}
