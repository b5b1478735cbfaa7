use crate::api::recipes::response::{load_recipe_response, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::Caller;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::ingest::ingest_recipe;
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use recipeshare_core::submission::{
    CATEGORIES, COOK_DURATION, DESCRIPTION, INGREDIENTS, INSTRUCTIONS, PREP_DURATION, TITLE,
};
use recipeshare_core::{NameList, SubmissionForm};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON form of a recipe. Multipart requests use the same field names plus
/// `thumbnail_image`, `step_by_step_zip_file` and `ingredient_zip_file`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecipeFields {
    pub title: Option<String>,
    pub description: Option<String>,
    /// One step per line
    pub instructions: Option<String>,
    /// Minutes; integers or numeric strings
    #[schema(value_type = Option<i32>)]
    pub prep_duration: Option<serde_json::Value>,
    #[schema(value_type = Option<i32>)]
    pub cook_duration: Option<serde_json::Value>,
    /// Comma-separated string or list of names
    #[schema(value_type = Option<Vec<String>>)]
    pub ingredients: Option<NameList>,
    #[schema(value_type = Option<Vec<String>>)]
    pub categories: Option<NameList>,
}

/// Text of a JSON scalar as a form field would carry it.
pub(crate) fn scalar_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

impl RecipeFields {
    fn fill(self, form: &mut SubmissionForm) {
        let text_fields = [
            (TITLE, self.title),
            (DESCRIPTION, self.description),
            (INSTRUCTIONS, self.instructions),
            (PREP_DURATION, self.prep_duration.map(scalar_text)),
            (COOK_DURATION, self.cook_duration.map(scalar_text)),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value {
                form.push_text(name, value);
            }
        }
        if let Some(names) = self.ingredients {
            form.push_names(INGREDIENTS, names);
        }
        if let Some(names) = self.categories {
            form.push_names(CATEGORIES, names);
        }
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Collect a submission from either a multipart or a JSON body.
async fn read_submission(request: Request) -> Result<SubmissionForm, ApiError> {
    let mut form = SubmissionForm::new();

    if is_multipart(&request) {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("Parsing error: {}", e.body_text())))?;

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let data = field.bytes().await?;
            form.push_field(&name, data.to_vec())?;
        }
    } else {
        let Json(fields) = Json::<RecipeFields>::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("Parsing error: {}", e.body_text())))?;
        fields.fill(&mut form);
    }

    Ok(form)
}

#[utoipa::path(
    post,
    path = "/recipes/",
    tag = "recipes",
    request_body(
        content(
            (RecipeFields = "application/json"),
            (RecipeFields = "multipart/form-data")
        )
    ),
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid fields, archive or image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not a creator", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    caller: Caller,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    caller.principal.ensure_can_create()?;

    let submission = read_submission(request).await?.validate()?;

    let mut conn = pool.get()?;
    let recipe_id = ingest_recipe(&mut conn, &config.media_root, caller.user.id, &submission)?;

    let recipe = load_recipe_response(&mut conn, recipe_id)?
        .ok_or_else(|| ApiError::Internal(format!("Recipe {} vanished after insert", recipe_id)))?;

    Ok((StatusCode::CREATED, Json(recipe)))
}
