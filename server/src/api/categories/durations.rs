use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::schema::{categories, recipe_categories, recipes};
use axum::{extract::State, Json};
use diesel::prelude::*;
use recipeshare_core::{sum_durations, CategoryDurations};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryDurationsResponse {
    pub category: String,
    /// Sum of prep durations of every recipe in the category
    pub total_prep_duration: i64,
    /// Sum of cook durations of every recipe in the category
    pub total_cook_duration: i64,
}

impl From<CategoryDurations> for CategoryDurationsResponse {
    fn from(d: CategoryDurations) -> Self {
        Self {
            category: d.category,
            total_prep_duration: d.total_prep_duration,
            total_cook_duration: d.total_cook_duration,
        }
    }
}

#[utoipa::path(
    get,
    path = "/categories/durations/",
    tag = "categories",
    responses(
        (status = 200, description = "Total prep and cook duration per category", body = Vec<CategoryDurationsResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn category_durations(
    State(pool): State<Arc<DbPool>>,
) -> Result<Json<Vec<CategoryDurationsResponse>>, ApiError> {
    let mut conn = pool.get()?;

    let all_categories: Vec<(Uuid, String)> = categories::table
        .order(categories::name.asc())
        .select((categories::id, categories::name))
        .load(&mut conn)?;

    let links: Vec<(Uuid, i32, i32)> = recipe_categories::table
        .inner_join(recipes::table)
        .select((
            recipe_categories::category_id,
            recipes::prep_duration,
            recipes::cook_duration,
        ))
        .load(&mut conn)?;

    Ok(Json(
        sum_durations(&all_categories, &links)
            .into_iter()
            .map(CategoryDurationsResponse::from)
            .collect(),
    ))
}
