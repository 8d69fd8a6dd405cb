pub mod departures;
pub mod error;
pub mod stops;

pub use error::{bad_request, not_found, ApiError, ErrorResponse};

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::providers::efa::EfaClient;
use crate::sync::MonitorStore;

#[derive(Clone)]
pub struct AppState {
    pub monitors: MonitorStore,
    pub efa_client: EfaClient,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RVV Departures API",
        description = "Real-time departures and sensor values for configured RVV stops"
    ),
    tags(
        (name = "stops", description = "Configured stops, stop search and sensors"),
        (name = "departures", description = "Departure boards")
    )
)]
pub struct ApiDoc;

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(stops::list::list_stops))
        .routes(routes!(stops::search::search_stops))
        .routes(routes!(stops::sensors::get_sensors))
        .routes(routes!(departures::list::list_departures))
        .routes(routes!(departures::refresh::refresh_departures))
        .with_state(state)
        .split_for_parts();

    router.route(
        "/api-docs/openapi.json",
        get(move || {
            let api = api.clone();
            async move { Json(api) }
        }),
    )
}
