use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StopSummary {
    pub stop_id: String,
    pub name: String,
    pub short_name: String,
    pub poll_interval_secs: u64,
    /// Next-departure sensor value, "N/A" when nothing is known
    pub next_departure: String,
    pub delay_minutes: i64,
    pub departure_count: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StopListResponse {
    pub stops: Vec<StopSummary>,
}

/// List all configured stops with their current next departure
#[utoipa::path(
    get,
    path = "/api/stops",
    responses(
        (status = 200, description = "Configured stops and their board state", body = StopListResponse)
    ),
    tag = "stops"
)]
pub async fn list_stops(State(state): State<AppState>) -> Json<StopListResponse> {
    let mut stops: Vec<StopSummary> = state
        .monitors
        .values()
        .map(|monitor| {
            let stop = monitor.stop();
            let snapshot = monitor.board().snapshot();
            StopSummary {
                stop_id: stop.stop_id.clone(),
                name: stop.display_name().to_string(),
                short_name: stop.display_short_name().to_string(),
                poll_interval_secs: stop.poll_interval_secs,
                next_departure: snapshot.next_departure_summary(),
                delay_minutes: snapshot.current_delay_minutes(),
                departure_count: snapshot.events.len(),
                refreshed_at: snapshot.refreshed_at,
            }
        })
        .collect();

    stops.sort_by(|a, b| a.stop_id.cmp(&b.stop_id));

    Json(StopListResponse { stops })
}
