use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shutterbook_domain::Slot;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListSlotsQuery {
    /// Defaults to now; exposed so clients can render future views.
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SlotResponse {
    pub id: Uuid,
    pub session_date_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String,
}

impl From<Slot> for SlotResponse {
    fn from(slot: Slot) -> Self {
        SlotResponse {
            id: slot.id,
            session_date_id: slot.session_date_id,
            start_at: slot.start_at,
            end_at: slot.end_at,
            status: slot.status.as_str().to_string(),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/dates/{date_id}/slots", get(list_available))
}

/// Open slots for a date, ordered by start time. A hold already past
/// its expiry reads as available even before the sweeper reclaims it,
/// so fresh visitors never see a false "fully booked".
async fn list_available(
    State(state): State<AppState>,
    Path(date_id): Path<Uuid>,
    Query(query): Query<ListSlotsQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let as_of = query.as_of.unwrap_or_else(Utc::now);
    let slots = state.slots.list_available(date_id, as_of).await?;
    Ok(Json(slots.into_iter().map(SlotResponse::from).collect()))
}
