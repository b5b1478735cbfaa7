use crate::api::ErrorResponse;
use crate::auth::Caller;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::NewFavorite;
use crate::schema::{favorites, recipes};
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use diesel::dsl::exists;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

/// Favorite the recipe if it isn't yet, otherwise un-favorite it.
#[utoipa::path(
    post,
    path = "/recipes/{id}/favorite/",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Recipe added to favorites"),
        (status = 204, description = "Recipe removed from favorites"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only viewers can favorite recipes", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_favorite(
    caller: Caller,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = pool.get()?;

    let recipe_exists: bool =
        diesel::select(exists(recipes::table.find(id))).get_result(&mut conn)?;
    if !recipe_exists {
        return Err(ApiError::NotFound("Recipe"));
    }

    caller.principal.ensure_can_favorite()?;
    let user_id = caller.user.id;

    let status = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let removed = diesel::delete(
            favorites::table
                .filter(favorites::user_id.eq(user_id))
                .filter(favorites::recipe_id.eq(id)),
        )
        .execute(conn)?;

        if removed > 0 {
            return Ok(StatusCode::NO_CONTENT);
        }

        diesel::insert_into(favorites::table)
            .values(&NewFavorite {
                user_id,
                recipe_id: id,
            })
            .on_conflict_do_nothing()
            .execute(conn)?;
        Ok(StatusCode::CREATED)
    })?;

    tracing::debug!(recipe_id = %id, user_id = %user_id, status = %status, "Toggled favorite");
    Ok(status)
}
