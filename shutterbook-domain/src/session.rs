use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable mini-session offering. Scheduling fields are frozen once
/// slots have been generated from it; display fields stay editable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiniSession {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub buffer_minutes: i32,
    pub price: i64,
    pub deposit_amount: i64,
    pub currency: String,
    pub capacity_per_slot: i32,
    pub allow_waitlist: bool,
    pub auto_confirm: bool,
    pub published: bool,
    /// Per-session override of the default hold TTL.
    pub hold_ttl_minutes: Option<i64>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MiniSession {
    /// Minutes a slot stays held for this session, falling back to the
    /// platform default when no override is set.
    pub fn hold_ttl_minutes(&self, default_minutes: i64) -> i64 {
        self.hold_ttl_minutes.unwrap_or(default_minutes)
    }

    /// Confirmation requires a payment step only when a deposit is due.
    pub fn requires_payment(&self) -> bool {
        self.deposit_amount > 0
    }
}

/// One calendar date scheduled under a MiniSession. Deleting a date
/// cascades to its slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDate {
    pub id: Uuid,
    pub mini_session_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location_override: Option<String>,
    pub created_at: DateTime<Utc>,
}
