use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shutterbook_domain::{MiniSession, SessionDate};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    owner_id: String,
    name: String,
    description: Option<String>,
    duration_minutes: i32,
    #[serde(default)]
    buffer_minutes: i32,
    #[serde(default)]
    price: i64,
    #[serde(default)]
    deposit_amount: i64,
    #[serde(default = "default_currency")]
    currency: String,
    #[serde(default = "default_capacity")]
    capacity_per_slot: i32,
    #[serde(default)]
    allow_waitlist: bool,
    #[serde(default)]
    auto_confirm: bool,
    hold_ttl_minutes: Option<i64>,
    location: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_capacity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
struct CreateDateRequest {
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    location_override: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateDateResponse {
    date_id: Uuid,
    slots_generated: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/{session_id}/dates", post(create_date))
}

async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<MiniSession>, AppError> {
    if req.duration_minutes <= 0 {
        return Err(AppError::ValidationError(
            "duration_minutes must be positive".into(),
        ));
    }

    let now = Utc::now();
    let session = state
        .sessions
        .create_session(MiniSession {
            id: Uuid::new_v4(),
            owner_id: req.owner_id,
            name: req.name,
            description: req.description,
            duration_minutes: req.duration_minutes,
            buffer_minutes: req.buffer_minutes,
            price: req.price,
            deposit_amount: req.deposit_amount,
            currency: req.currency,
            capacity_per_slot: req.capacity_per_slot,
            allow_waitlist: req.allow_waitlist,
            auto_confirm: req.auto_confirm,
            published: false,
            hold_ttl_minutes: req.hold_ttl_minutes,
            location: req.location,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!(session_id = %session.id, "mini-session created");
    Ok(Json(session))
}

/// Schedule a date and generate its slot inventory in one step.
/// Generation is idempotent per date, so a retried request cannot
/// duplicate slots.
async fn create_date(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<CreateDateRequest>,
) -> Result<Json<CreateDateResponse>, AppError> {
    // Existence check before inserting the child row.
    state.sessions.get_session(session_id).await?;

    if req.end_at <= req.start_at {
        return Err(AppError::ValidationError(
            "end_at must be after start_at".into(),
        ));
    }

    let now = Utc::now();
    let date = state
        .sessions
        .create_date(SessionDate {
            id: Uuid::new_v4(),
            mini_session_id: session_id,
            start_at: req.start_at,
            end_at: req.end_at,
            location_override: req.location_override,
            created_at: now,
        })
        .await?;

    let slots_generated = state.generator.generate(date.id, now).await?;

    Ok(Json(CreateDateResponse {
        date_id: date.id,
        slots_generated,
    }))
}
