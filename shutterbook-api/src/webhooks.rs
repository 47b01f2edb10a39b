use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentWebhook {
    pub reference: String,
    pub status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/payments", post(handle_payment_webhook))
}

/// Receive payment status updates from the provider, correlated by the
/// reference stored on the booking at confirmation time. A failed or
/// reversed payment cancels the booking, which releases the slot and
/// runs the waitlist check.
async fn handle_payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<PaymentWebhook>,
) -> Result<StatusCode, StatusCode> {
    tracing::info!(reference = %payload.reference, status = %payload.status, "received payment webhook");

    let booking = state
        .bookings
        .find_by_payment_reference(&payload.reference)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let Some(booking) = booking else {
        // Unknown reference: acknowledge so the provider stops
        // retrying; there is nothing to correlate it to.
        tracing::warn!(reference = %payload.reference, "webhook for unknown payment reference");
        return Ok(StatusCode::OK);
    };

    match payload.status.as_str() {
        "failed" | "reversed" => {
            state
                .confirmer
                .cancel(booking.id, Utc::now())
                .await
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
            tracing::info!(booking_id = %booking.id, "booking cancelled via payment webhook");
        }
        "succeeded" => {
            tracing::info!(booking_id = %booking.id, "payment settlement confirmed");
        }
        other => {
            tracing::warn!(booking_id = %booking.id, status = other, "unhandled payment status");
        }
    }

    Ok(StatusCode::OK)
}
