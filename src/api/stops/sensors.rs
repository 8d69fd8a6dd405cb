use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::{not_found, ApiError, AppState, ErrorResponse};
use crate::services::SensorState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorListResponse {
    pub sensors: Vec<SensorState>,
}

/// Next-departure and delay sensor values for a stop
#[utoipa::path(
    get,
    path = "/api/stops/{stop_id}/sensors",
    params(
        ("stop_id" = String, Path, description = "Configured stop id, e.g. de:09362:12009")
    ),
    responses(
        (status = 200, description = "Sensor states", body = SensorListResponse),
        (status = 404, description = "Stop not configured", body = ErrorResponse)
    ),
    tag = "stops"
)]
pub async fn get_sensors(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<SensorListResponse>, ApiError> {
    let monitor = state.monitors.get(&stop_id).ok_or_else(|| not_found(&stop_id))?;

    Ok(Json(SensorListResponse {
        sensors: monitor.sensors(),
    }))
}
