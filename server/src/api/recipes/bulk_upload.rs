use crate::api::ErrorResponse;
use crate::auth::Caller;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::NewRecipe;
use crate::schema::recipes;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use recipeshare_core::parse_workbook;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const FILE_FIELD: &str = "file";

/// Rows per INSERT. Each row binds 9 parameters and PostgreSQL caps a
/// statement at 65535.
const INSERT_CHUNK_SIZE: usize = 1000;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkUploadResponse {
    pub message: String,
    /// Number of recipes created
    pub created: usize,
}

/// Multipart body for a spreadsheet import.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct BulkUploadForm {
    /// `.xlsx`, `.xls` or `.ods` workbook. First row is the header:
    /// title, description, instructions, prep_duration, cook_duration
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/recipes/bulk-upload/",
    tag = "recipes",
    request_body(content = BulkUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "All rows imported", body = BulkUploadResponse),
        (status = 400, description = "Missing file or malformed row; nothing imported", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only creators can bulk upload", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn bulk_upload(
    caller: Caller,
    State(pool): State<Arc<DbPool>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    caller.principal.ensure_can_bulk_import()?;

    let mut workbook = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            workbook = Some(field.bytes().await?.to_vec());
        }
    }
    let workbook = workbook.ok_or_else(|| ApiError::field(FILE_FIELD, "No file was submitted."))?;

    // Parse every row before touching the database
    let rows = parse_workbook(workbook)?;

    let creator_id = caller.user.id;
    let new_recipes: Vec<NewRecipe> = rows
        .iter()
        .map(|row| NewRecipe {
            id: Uuid::new_v4(),
            creator_id: Some(creator_id),
            title: &row.title,
            description: &row.description,
            instructions: &row.instructions,
            prep_duration: row.prep_duration,
            cook_duration: row.cook_duration,
            thumbnail_image: None,
            storage_dir: None,
        })
        .collect();

    let mut conn = pool.get()?;
    let created = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let mut created = 0;
        for chunk in new_recipes.chunks(INSERT_CHUNK_SIZE) {
            created += diesel::insert_into(recipes::table)
                .values(chunk)
                .execute(conn)?;
        }
        Ok(created)
    })?;

    tracing::info!(creator_id = %creator_id, created, "Bulk imported recipes");

    Ok((
        StatusCode::CREATED,
        Json(BulkUploadResponse {
            message: "Recipes uploaded successfully.".to_string(),
            created,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use crate::models::Recipe;
    use crate::schema::recipes;
    use crate::test_support::{multipart_request, unique, xlsx_of, TestApp};
    use axum::http::StatusCode;
    use diesel::prelude::*;
    use uuid::Uuid;

    const HEADER: &[&str] = &["title", "description", "instructions", "prep_duration", "cook_duration"];

    fn recipes_by(app: &TestApp, creator: Uuid) -> Vec<Recipe> {
        let mut conn = app.conn();
        recipes::table
            .filter(recipes::creator_id.eq(creator))
            .select(Recipe::as_select())
            .load(&mut conn)
            .unwrap()
    }

    #[tokio::test]
    async fn test_creator_imports_every_row() {
        let Some(app) = TestApp::start() else { return };
        let (creator, token) = app.creator();
        let soup = unique("Soup");
        let workbook = xlsx_of(&[
            HEADER,
            &[soup.as_str(), "Hot", "Boil", "10", "20"],
            &["Salad", "Cold", "Toss", "5", "0"],
        ]);

        let (status, body) = app
            .send(multipart_request(
                "/recipes/bulk-upload/",
                &token,
                &[],
                &[("file", "recipes.xlsx", workbook)],
            ))
            .await;

        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["created"], 2);
        assert_eq!(body["message"], "Recipes uploaded successfully.");

        let rows = recipes_by(&app, creator);
        assert_eq!(rows.len(), 2);
        let imported = rows.iter().find(|r| r.title == soup).unwrap();
        assert_eq!(imported.prep_duration, 10);
        assert_eq!(imported.cook_duration, 20);
    }

    #[tokio::test]
    async fn test_bad_row_imports_nothing() {
        let Some(app) = TestApp::start() else { return };
        let (creator, token) = app.creator();
        let workbook = xlsx_of(&[
            HEADER,
            &["Good", "", "", "1", "2"],
            &["Bad", "", "", "soon", "2"],
        ]);

        let (status, body) = app
            .send(multipart_request(
                "/recipes/bulk-upload/",
                &token,
                &[],
                &[("file", "recipes.xlsx", workbook)],
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert!(body["error"].as_str().unwrap().contains("Row 3"), "{}", body);
        assert!(recipes_by(&app, creator).is_empty());
    }

    #[tokio::test]
    async fn test_viewer_cannot_bulk_upload() {
        let Some(app) = TestApp::start() else { return };
        let (viewer, token) = app.viewer();
        let workbook = xlsx_of(&[HEADER, &["Tea", "", "", "0", "5"]]);

        let (status, _) = app
            .send(multipart_request(
                "/recipes/bulk-upload/",
                &token,
                &[],
                &[("file", "recipes.xlsx", workbook)],
            ))
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(recipes_by(&app, viewer).is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_field_error() {
        let Some(app) = TestApp::start() else { return };
        let (_, token) = app.creator();

        let (status, body) = app
            .send(multipart_request("/recipes/bulk-upload/", &token, &[("note", "x")], &[]))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"]["file"].is_string(), "{}", body);
    }
}
