use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shutterbook_domain::Booking;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ConfirmRequest {
    contact_email: String,
    contact_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking_id: Uuid,
    slot_id: Uuid,
    status: String,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        BookingResponse {
            booking_id: b.id,
            slot_id: b.slot_id,
            status: b.status.as_str().to_string(),
            payment_reference: b.payment_reference,
            created_at: b.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/slots/{slot_id}/confirm", post(confirm_booking))
        .route("/v1/bookings/{booking_id}/cancel", post(cancel_booking))
}

/// Finalize a held slot (or book directly on an auto-confirm session).
/// Contention comes back as 409 — the caller refreshes the listing
/// rather than retrying the same slot.
async fn confirm_booking(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .confirmer
        .confirm(slot_id, &req.contact_email, req.contact_name, Utc::now())
        .await?;
    Ok(Json(BookingResponse::from(booking)))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let (booking, _slot) = state.confirmer.cancel(booking_id, Utc::now()).await?;
    Ok(Json(BookingResponse::from(booking)))
}
