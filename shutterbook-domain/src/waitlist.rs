use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot::Slot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistStatus {
    Waiting,
    Notified,
    Converted,
    Expired,
}

impl WaitlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitlistStatus::Waiting => "waiting",
            WaitlistStatus::Notified => "notified",
            WaitlistStatus::Converted => "converted",
            WaitlistStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(WaitlistStatus::Waiting),
            "notified" => Some(WaitlistStatus::Notified),
            "converted" => Some(WaitlistStatus::Converted),
            "expired" => Some(WaitlistStatus::Expired),
            _ => None,
        }
    }
}

/// A standby request scoped to a MiniSession or one of its dates.
/// Promotion is FIFO by `created_at`, tie-broken by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub mini_session_id: Uuid,
    /// None scopes the entry to the whole session (any date matches).
    pub session_date_id: Option<Uuid>,
    pub contact_email: String,
    pub contact_name: Option<String>,
    /// Free-form "HH:MM" fragments; a secondary filter applied at
    /// promotion time. Empty means any time.
    pub preferred_times: Vec<String>,
    pub status: WaitlistStatus,
    pub notified_at: Option<DateTime<Utc>>,
    /// Set when the entry converts: the booking that closed it.
    pub converted_booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Date-level matching is handled by the repository query; this is
    /// the secondary time filter the promotion step applies.
    pub fn matches_slot_time(&self, slot: &Slot) -> bool {
        if self.preferred_times.is_empty() {
            return true;
        }
        let start = slot.start_at.format("%H:%M").to_string();
        self.preferred_times.iter().any(|p| start.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotStatus;
    use chrono::TimeZone;

    fn entry(preferred: &[&str]) -> WaitlistEntry {
        WaitlistEntry {
            id: Uuid::new_v4(),
            mini_session_id: Uuid::new_v4(),
            session_date_id: None,
            contact_email: "wait@example.com".into(),
            contact_name: None,
            preferred_times: preferred.iter().map(|s| s.to_string()).collect(),
            status: WaitlistStatus::Waiting,
            notified_at: None,
            converted_booking_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        }
    }

    fn slot_starting(h: u32, m: u32) -> Slot {
        let start = Utc.with_ymd_and_hms(2025, 6, 7, h, m, 0).unwrap();
        Slot {
            id: Uuid::new_v4(),
            session_date_id: Uuid::new_v4(),
            start_at: start,
            end_at: start + chrono::Duration::minutes(20),
            status: SlotStatus::Available,
            booking_id: None,
            held_until: None,
            held_by: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn empty_preferences_match_any_time() {
        assert!(entry(&[]).matches_slot_time(&slot_starting(14, 40)));
    }

    #[test]
    fn time_preferences_filter_by_start() {
        let e = entry(&["09:00", "09:30"]);
        assert!(e.matches_slot_time(&slot_starting(9, 30)));
        assert!(!e.matches_slot_time(&slot_starting(14, 0)));
    }
}
