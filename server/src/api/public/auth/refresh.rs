use crate::api::ErrorResponse;
use crate::auth::{create_session, get_user_from_refresh_token, SessionKind};
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access: String,
}

#[utoipa::path(
    post,
    path = "/api/token/refresh/",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Unknown or expired refresh token", body = ErrorResponse)
    )
)]
pub async fn refresh_token(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let mut conn = pool.get()?;

    let user = get_user_from_refresh_token(&mut conn, &req.refresh)?
        .ok_or(ApiError::Unauthorized("Invalid or expired token"))?;

    let access = create_session(
        &mut conn,
        user.id,
        SessionKind::Access,
        config.access_token_ttl,
    )?;

    Ok(Json(RefreshResponse { access }))
}
