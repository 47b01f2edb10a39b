use uuid::Uuid;

/// Engine error taxonomy. Contention errors are expected outcomes the
/// caller handles locally (refresh the listing, pick another slot);
/// nothing here is process-fatal.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("slot {slot_id} is unavailable")]
    SlotUnavailable { slot_id: Uuid },

    #[error("slot {slot_id} is held by another contact")]
    HoldMismatch { slot_id: Uuid },

    #[error("hold on slot {slot_id} has expired")]
    ExpiredHold { slot_id: Uuid },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("payment declined: {reason}")]
    PaymentFailed { reason: String },

    #[error("waitlist is not enabled for session {session_id}")]
    WaitlistClosed { session_id: Uuid },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        EngineError::NotFound { entity, id }
    }

    /// Contention outcomes the booking flow treats as "slot no longer
    /// available" rather than failures worth surfacing as 5xx.
    pub fn is_contention(&self) -> bool {
        matches!(
            self,
            EngineError::SlotUnavailable { .. }
                | EngineError::HoldMismatch { .. }
                | EngineError::ExpiredHold { .. }
        )
    }
}
