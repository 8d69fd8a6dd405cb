use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Helper for requests naming a stop that is not configured
pub fn not_found(stop_id: &str) -> ApiError {
    debug!(stop_id = %stop_id, "Unknown stop requested");
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Stop not configured: {stop_id}"),
        }),
    )
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
