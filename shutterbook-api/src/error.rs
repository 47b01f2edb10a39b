use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shutterbook_domain::EngineError;

#[derive(Debug)]
pub enum AppError {
    Conflict { code: &'static str, message: String },
    NotFound(String),
    PaymentRequired(String),
    ValidationError(String),
    InternalServerError(String),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::SlotUnavailable { .. } => AppError::Conflict {
                code: "slot_unavailable",
                message: err.to_string(),
            },
            EngineError::HoldMismatch { .. } => AppError::Conflict {
                code: "hold_mismatch",
                message: err.to_string(),
            },
            EngineError::ExpiredHold { .. } => AppError::Conflict {
                code: "expired_hold",
                message: err.to_string(),
            },
            EngineError::WaitlistClosed { .. } => AppError::Conflict {
                code: "waitlist_closed",
                message: err.to_string(),
            },
            EngineError::NotFound { .. } => AppError::NotFound(err.to_string()),
            EngineError::PaymentFailed { .. } => AppError::PaymentRequired(err.to_string()),
            EngineError::Validation { .. } => AppError::ValidationError(err.to_string()),
            EngineError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::PaymentRequired(msg) => {
                (StatusCode::PAYMENT_REQUIRED, "payment_failed", msg)
            }
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
