pub mod bulk_upload;
pub mod create;
pub mod delete;
pub mod favorite;
pub mod get;
pub mod list;
pub mod response;
pub mod update;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /recipes/ endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/recipes/",
            get(list::list_recipes).post(create::create_recipe),
        )
        .route("/recipes/bulk-upload/", post(bulk_upload::bulk_upload))
        .route(
            "/recipes/{id}/",
            get(get::get_recipe)
                .put(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .route("/recipes/{id}/favorite/", post(favorite::toggle_favorite))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        create::create_recipe,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
        favorite::toggle_favorite,
        bulk_upload::bulk_upload,
    ),
    components(schemas(
        create::RecipeFields,
        response::RecipeResponse,
        response::IngredientResponse,
        response::CategoryResponse,
        response::StepImageResponse,
        bulk_upload::BulkUploadForm,
        bulk_upload::BulkUploadResponse,
    ))
)]
pub struct ApiDoc;
