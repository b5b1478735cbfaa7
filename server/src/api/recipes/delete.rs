use crate::api::ErrorResponse;
use crate::auth::Caller;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::Recipe;
use crate::schema::recipes;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use diesel::prelude::*;
use std::io::ErrorKind;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not this recipe's creator", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    caller: Caller,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = pool.get()?;

    let recipe: Recipe = recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or(ApiError::NotFound("Recipe"))?;

    caller.principal.ensure_can_delete(recipe.creator_id)?;

    // Step images, links and favorites go with it via ON DELETE CASCADE
    diesel::delete(recipes::table.find(id)).execute(&mut conn)?;

    if let Some(dir) = &recipe.storage_dir {
        let path = config.media_root.join(dir);
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(dir = %path.display(), error = %e, "Failed to remove recipe files")
            }
        }
    }

    tracing::info!(recipe_id = %id, "Deleted recipe");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::schema::{categories, ingredients, step_images};
    use crate::test_support::{empty_request, multipart_request, unique, zip_of, TestApp};
    use axum::http::{Method, StatusCode};
    use diesel::prelude::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_delete_cascades_steps_but_keeps_shared_rows() {
        let Some(app) = TestApp::start() else { return };
        let (_, token) = app.creator();
        let ingredient = unique("Butter");
        let category = unique("Baking");

        let archive = zip_of(&[("step_1.jpg", b"1".as_slice()), ("step_2.jpg", b"2".as_slice())]);
        let (status, recipe) = app
            .send(multipart_request(
                "/recipes/",
                &token,
                &[
                    ("title", "Shortbread"),
                    ("instructions", "Cream\nBake"),
                    ("ingredients", ingredient.as_str()),
                    ("categories", category.as_str()),
                ],
                &[("step_by_step_zip_file", "s.zip", archive)],
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", recipe);
        let id: Uuid = recipe["id"].as_str().unwrap().parse().unwrap();
        let step_file = app.media.path().join(recipe["step_images"][0]["image"].as_str().unwrap());
        assert!(step_file.is_file());

        let uri = format!("/recipes/{}/", id);
        let (status, _) = app.send(empty_request(Method::DELETE, &uri, Some(&token))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let mut conn = app.conn();
        let steps: i64 = step_images::table
            .filter(step_images::recipe_id.eq(id))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(steps, 0);
        assert!(!step_file.exists());

        let ingredient_rows: i64 = ingredients::table
            .filter(ingredients::name.eq(&ingredient))
            .count()
            .get_result(&mut conn)
            .unwrap();
        let category_rows: i64 = categories::table
            .filter(categories::name.eq(&category))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(ingredient_rows, 1);
        assert_eq!(category_rows, 1);

        let (status, _) = app.send(empty_request(Method::GET, &uri, Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_creator_cannot_delete() {
        let Some(app) = TestApp::start() else { return };
        let (_, owner) = app.creator();
        let (_, other) = app.creator();
        let recipe =
            crate::test_support::create_recipe(&app, &owner, serde_json::json!({"title": "Mine"})).await;
        let uri = format!("/recipes/{}/", recipe["id"].as_str().unwrap());

        let (status, body) = app.send(empty_request(Method::DELETE, &uri, Some(&other))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "You do not have permission to delete this recipe.");

        let (status, _) = app.send(empty_request(Method::GET, &uri, Some(&owner))).await;
        assert_eq!(status, StatusCode::OK);
    }
}
