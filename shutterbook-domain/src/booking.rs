use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// The confirmed reservation record, linked 1:1 to the slot that
/// produced it. The slot row stays the authority on occupancy; this is
/// a back-reference kept for audit and payment correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub contact_email: String,
    pub contact_name: Option<String>,
    pub status: BookingStatus,
    pub payment_reference: Option<String>,
    pub amount_paid: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a booking; the store assigns nothing, the id is
/// minted by the caller so the slot transition can reference it.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub contact_email: String,
    pub contact_name: Option<String>,
    pub payment_reference: Option<String>,
    pub amount_paid: i64,
    pub currency: String,
}

impl NewBooking {
    pub fn into_booking(self, now: DateTime<Utc>) -> Booking {
        Booking {
            id: self.id,
            slot_id: self.slot_id,
            contact_email: self.contact_email,
            contact_name: self.contact_name,
            status: BookingStatus::Confirmed,
            payment_reference: self.payment_reference,
            amount_paid: self.amount_paid,
            currency: self.currency,
            created_at: now,
            updated_at: now,
        }
    }
}
