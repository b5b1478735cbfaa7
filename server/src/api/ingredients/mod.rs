pub mod list;
pub mod recipes;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /ingredients/ endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingredients/", get(list::list_ingredients))
        .route("/ingredients/{id}/recipes/", get(recipes::ingredient_recipes))
}

#[derive(OpenApi)]
#[openapi(paths(list::list_ingredients, recipes::ingredient_recipes))]
pub struct ApiDoc;
