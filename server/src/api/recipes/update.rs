use crate::api::recipes::create::{scalar_text, RecipeFields};
use crate::api::recipes::response::{load_recipe_response, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::Caller;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::ingest::{link_categories, link_ingredients, upsert_categories, upsert_ingredients};
use crate::models::RecipeChanges;
use crate::schema::{recipe_categories, recipe_ingredients, recipes};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use recipeshare_core::submission::{CATEGORIES, COOK_DURATION, INGREDIENTS, PREP_DURATION, TITLE};
use recipeshare_core::{check_length, check_names};
use std::sync::Arc;
use uuid::Uuid;

fn parse_duration(field: &str, value: Option<serde_json::Value>) -> Result<Option<i32>, ApiError> {
    value
        .map(|v| {
            scalar_text(v)
                .trim()
                .parse::<i32>()
                .map_err(|_| ApiError::field(field, "A valid integer is required."))
        })
        .transpose()
}

#[utoipa::path(
    put,
    path = "/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = RecipeFields,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not this recipe's creator", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    caller: Caller,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecipeFields>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let mut conn = pool.get()?;

    let creator_id: Option<Uuid> = recipes::table
        .find(id)
        .select(recipes::creator_id)
        .first(&mut conn)
        .optional()?
        .ok_or(ApiError::NotFound("Recipe"))?;

    caller.principal.ensure_can_modify(creator_id)?;

    let title = request.title.as_deref().map(str::trim);
    if title == Some("") {
        return Err(ApiError::field(TITLE, "This field may not be blank."));
    }
    if let Some(message) = title.and_then(check_length) {
        return Err(ApiError::field(TITLE, &message));
    }
    let prep_duration = parse_duration(PREP_DURATION, request.prep_duration)?;
    let cook_duration = parse_duration(COOK_DURATION, request.cook_duration)?;
    let ingredients = request.ingredients.map(|names| names.into_names());
    let categories = request.categories.map(|names| names.into_names());
    for (field, names) in [(INGREDIENTS, &ingredients), (CATEGORIES, &categories)] {
        if let Some(message) = names.as_deref().and_then(check_names) {
            return Err(ApiError::field(field, &message));
        }
    }

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::update(recipes::table.find(id))
            .set(&RecipeChanges {
                title,
                description: request.description.as_deref(),
                instructions: request.instructions.as_deref(),
                prep_duration,
                cook_duration,
                updated_at: Utc::now(),
            })
            .execute(conn)?;

        if let Some(names) = &ingredients {
            diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(id)))
                .execute(conn)?;
            let ids = upsert_ingredients(conn, names)?;
            link_ingredients(conn, id, &ids)?;
        }

        if let Some(names) = &categories {
            diesel::delete(recipe_categories::table.filter(recipe_categories::recipe_id.eq(id)))
                .execute(conn)?;
            let ids = upsert_categories(conn, names)?;
            link_categories(conn, id, &ids)?;
        }

        Ok(())
    })?;

    tracing::info!(recipe_id = %id, "Updated recipe");

    load_recipe_response(&mut conn, id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Recipe"))
}
