pub mod durations;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /categories/ endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new().route("/categories/durations/", get(durations::category_durations))
}

#[derive(OpenApi)]
#[openapi(
    paths(durations::category_durations),
    components(schemas(durations::CategoryDurationsResponse))
)]
pub struct ApiDoc;
