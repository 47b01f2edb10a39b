use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct HoldRequest {
    contact_email: String,
}

#[derive(Debug, Serialize)]
struct HoldResponse {
    slot_id: Uuid,
    status: String,
    held_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ReleaseResponse {
    slot_id: Uuid,
    released: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/v1/slots/{slot_id}/hold",
        post(place_hold).put(renew_hold).delete(release_hold),
    )
}

async fn place_hold(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
    Json(req): Json<HoldRequest>,
) -> Result<Json<HoldResponse>, AppError> {
    let slot = state
        .holds
        .place_hold(slot_id, &req.contact_email, Utc::now())
        .await?;
    Ok(Json(HoldResponse {
        slot_id: slot.id,
        status: slot.status.as_str().to_string(),
        held_until: slot.held_until,
    }))
}

async fn renew_hold(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
    Json(req): Json<HoldRequest>,
) -> Result<Json<HoldResponse>, AppError> {
    let slot = state
        .holds
        .renew_hold(slot_id, &req.contact_email, Utc::now())
        .await?;
    Ok(Json(HoldResponse {
        slot_id: slot.id,
        status: slot.status.as_str().to_string(),
        held_until: slot.held_until,
    }))
}

/// Voluntary release; a released slot immediately goes through the
/// waitlist check. Releasing a slot this contact does not hold is a
/// no-op, not an error.
async fn release_hold(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
    Json(req): Json<HoldRequest>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let now = Utc::now();
    let released = state
        .holds
        .release_hold(slot_id, &req.contact_email, now)
        .await?;

    let was_released = released.is_some();
    if let Some(slot) = released {
        state.coordinator.on_slot_released(&slot, now).await?;
    }

    Ok(Json(ReleaseResponse {
        slot_id,
        released: was_released,
    }))
}
