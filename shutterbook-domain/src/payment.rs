use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
}

/// Outcome of the external payment step, correlated back to the hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    pub status: PaymentStatus,
    /// Provider transaction id, stored on the booking for webhook
    /// correlation.
    pub reference: Option<String>,
    pub failure_reason: Option<String>,
}

impl PaymentResult {
    pub fn succeeded(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }
}

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub slot_id: Uuid,
    pub contact_email: String,
    pub amount: i64,
    pub currency: String,
}

/// External payment collaborator. Only the success/failure result
/// matters to the engine; capture details live with the provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<PaymentResult, EngineError>;
}
