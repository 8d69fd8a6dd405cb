use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::{not_found, ApiError, AppState, ErrorResponse};
use crate::services::RefreshOutcome;

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub stop_id: String,
    /// False when the upstream request failed and the old board was kept
    pub updated: bool,
    pub departure_count: usize,
}

/// Run one fetch cycle for a stop outside its polling schedule
#[utoipa::path(
    post,
    path = "/api/stops/{stop_id}/refresh",
    params(
        ("stop_id" = String, Path, description = "Configured stop id, e.g. de:09362:12009")
    ),
    responses(
        (status = 200, description = "Refresh attempted", body = RefreshResponse),
        (status = 404, description = "Stop not configured", body = ErrorResponse)
    ),
    tag = "departures"
)]
pub async fn refresh_departures(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let monitor = state.monitors.get(&stop_id).ok_or_else(|| not_found(&stop_id))?;

    let (updated, departure_count) = match monitor.refresh().await {
        RefreshOutcome::Updated(count) => (true, count),
        RefreshOutcome::Unchanged => (false, monitor.board().snapshot().events.len()),
    };

    Ok(Json(RefreshResponse {
        stop_id,
        updated,
        departure_count,
    }))
}
