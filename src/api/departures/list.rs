use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::{not_found, ApiError, AppState, ErrorResponse};
use crate::models::DepartureEvent;

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartureListResponse {
    pub stop_id: String,
    /// Ordered by planned departure
    pub departures: Vec<DepartureEvent>,
    /// One "{line} {direction}: {HH:MM} ({delay}min delay)" line per departure
    pub summaries: Vec<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Current departure board of a configured stop
#[utoipa::path(
    get,
    path = "/api/stops/{stop_id}/departures",
    params(
        ("stop_id" = String, Path, description = "Configured stop id, e.g. de:09362:12009")
    ),
    responses(
        (status = 200, description = "Departures held for the stop", body = DepartureListResponse),
        (status = 404, description = "Stop not configured", body = ErrorResponse)
    ),
    tag = "departures"
)]
pub async fn list_departures(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<DepartureListResponse>, ApiError> {
    let monitor = state.monitors.get(&stop_id).ok_or_else(|| not_found(&stop_id))?;
    let snapshot = monitor.board().snapshot();

    Ok(Json(DepartureListResponse {
        stop_id,
        summaries: snapshot.departure_list_summary(),
        departures: snapshot.events.clone(),
        refreshed_at: snapshot.refreshed_at,
    }))
}
