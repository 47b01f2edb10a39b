use async_trait::async_trait;
use uuid::Uuid;

use shutterbook_domain::{
    ChargeRequest, EngineError, PaymentProvider, PaymentResult, PaymentStatus,
};

/// Stand-in provider for environments without payment credentials:
/// every charge succeeds with a synthetic reference. The production
/// adapter implements the same trait against the real provider API.
#[derive(Debug, Default, Clone)]
pub struct OfflinePaymentProvider;

#[async_trait]
impl PaymentProvider for OfflinePaymentProvider {
    async fn charge(&self, request: &ChargeRequest) -> Result<PaymentResult, EngineError> {
        let reference = format!("offline-{}", Uuid::new_v4());
        tracing::info!(
            slot_id = %request.slot_id,
            amount = request.amount,
            currency = %request.currency,
            reference = %reference,
            "offline payment approved"
        );
        Ok(PaymentResult {
            status: PaymentStatus::Succeeded,
            reference: Some(reference),
            failure_reason: None,
        })
    }
}
