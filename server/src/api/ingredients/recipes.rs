use crate::api::recipes::response::{load_recipe_responses, RecipeResponse};
use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::Recipe;
use crate::schema::{ingredients, recipe_ingredients, recipes};
use axum::{
    extract::{Path, State},
    Json,
};
use diesel::dsl::exists;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/ingredients/{id}/recipes/",
    tag = "ingredients",
    params(
        ("id" = Uuid, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Recipes that use the ingredient", body = Vec<RecipeResponse>),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn ingredient_recipes(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    let mut conn = pool.get()?;

    let ingredient_exists: bool =
        diesel::select(exists(ingredients::table.find(id))).get_result(&mut conn)?;
    if !ingredient_exists {
        return Err(ApiError::NotFound("Ingredient"));
    }

    let rows: Vec<Recipe> = recipes::table
        .inner_join(recipe_ingredients::table)
        .filter(recipe_ingredients::ingredient_id.eq(id))
        .order(recipes::created_at.desc())
        .select(Recipe::as_select())
        .load(&mut conn)?;

    Ok(Json(load_recipe_responses(&mut conn, rows)?))
}
