use crate::api::recipes::response::IngredientResponse;
use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::Ingredient;
use crate::schema::ingredients;
use axum::{extract::State, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/ingredients/",
    tag = "ingredients",
    responses(
        (status = 200, description = "All ingredients, by name", body = Vec<IngredientResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_ingredients(
    State(pool): State<Arc<DbPool>>,
) -> Result<Json<Vec<IngredientResponse>>, ApiError> {
    let mut conn = pool.get()?;

    let rows: Vec<Ingredient> = ingredients::table
        .order(ingredients::name.asc())
        .select(Ingredient::as_select())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(IngredientResponse::from).collect()))
}
