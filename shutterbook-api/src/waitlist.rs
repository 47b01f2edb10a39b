use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shutterbook_domain::WaitlistEntry;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct JoinRequest {
    mini_session_id: Uuid,
    session_date_id: Option<Uuid>,
    contact_email: String,
    contact_name: Option<String>,
    #[serde(default)]
    preferred_times: Vec<String>,
}

#[derive(Debug, Serialize)]
struct JoinResponse {
    entry_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<WaitlistEntry> for JoinResponse {
    fn from(e: WaitlistEntry) -> Self {
        JoinResponse {
            entry_id: e.id,
            status: e.status.as_str().to_string(),
            created_at: e.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/waitlist", post(join_waitlist))
}

async fn join_waitlist(
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    let entry = state
        .coordinator
        .join(
            req.mini_session_id,
            req.session_date_id,
            req.contact_email,
            req.contact_name,
            req.preferred_times,
            Utc::now(),
        )
        .await?;
    Ok(Json(JoinResponse::from(entry)))
}
