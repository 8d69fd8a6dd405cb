use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::{bad_request, ApiError, AppState, ErrorResponse};
use crate::models::StopCandidate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StopSearchQuery {
    /// Stop name or part of it, e.g. "Hauptbahnhof"
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StopSearchResponse {
    pub stops: Vec<StopCandidate>,
}

/// Look up stop ids by name via the EFA stop finder
///
/// Upstream failures yield an empty list.
#[utoipa::path(
    get,
    path = "/api/stops/search",
    params(StopSearchQuery),
    responses(
        (status = 200, description = "Stops usable as departure monitor ids", body = StopSearchResponse),
        (status = 400, description = "Empty search term", body = ErrorResponse)
    ),
    tag = "stops"
)]
pub async fn search_stops(
    State(state): State<AppState>,
    Query(query): Query<StopSearchQuery>,
) -> Result<Json<StopSearchResponse>, ApiError> {
    let name = query.name.trim();
    if name.is_empty() {
        return Err(bad_request("name must not be empty"));
    }

    let stops = state.efa_client.search_stops(name).await;

    Ok(Json(StopSearchResponse { stops }))
}
