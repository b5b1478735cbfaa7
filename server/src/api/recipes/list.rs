use crate::api::recipes::response::{load_recipe_responses, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::Caller;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::Recipe;
use crate::schema::recipes;
use axum::{extract::State, Json};
use diesel::prelude::*;
use recipeshare_core::RecipeScope;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/recipes/",
    tag = "recipes",
    responses(
        (status = 200, description = "All recipes for viewers, own recipes for creators", body = Vec<RecipeResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is neither creator nor viewer", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    caller: Caller,
    State(pool): State<Arc<DbPool>>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    let scope = caller.principal.recipe_scope()?;
    let mut conn = pool.get()?;

    let mut query = recipes::table
        .order(recipes::created_at.desc())
        .select(Recipe::as_select())
        .into_boxed();

    if let RecipeScope::CreatedBy(creator_id) = scope {
        query = query.filter(recipes::creator_id.eq(creator_id));
    }

    let rows = query.load(&mut conn)?;
    Ok(Json(load_recipe_responses(&mut conn, rows)?))
}
