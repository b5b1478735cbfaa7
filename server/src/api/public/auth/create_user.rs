use crate::api::ErrorResponse;
use crate::auth::{hash_password, issue_token_pair};
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{NewProfile, NewUser, User};
use crate::schema::{profiles, users};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Creator,
    Viewer,
}

impl Role {
    /// `"creator"` makes a creator; anything else, or nothing, a viewer.
    pub fn from_request(role: Option<&str>) -> Self {
        match role {
            Some("creator") => Role::Creator,
            _ => Role::Viewer,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    /// `creator` or `viewer`. Any other value, or none, means `viewer`
    #[serde(default)]
    #[schema(example = "creator")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateUserResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[utoipa::path(
    post,
    path = "/create-user/",
    tag = "auth",
    request_body(content = CreateUserRequest, example = json!({"username": "chef", "password": "password", "role": "creator"})),
    responses(
        (status = 201, description = "User created", body = CreateUserResponse),
        (status = 400, description = "Invalid request or username taken", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(ApiError::field("username", "This field may not be blank."));
    }
    if req.password.is_empty() {
        return Err(ApiError::field("password", "This field may not be blank."));
    }

    let role = Role::from_request(req.role.as_deref());

    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    let mut conn = pool.get()?;

    let tokens = conn
        .transaction::<_, DieselError, _>(|conn| {
            let user: User = diesel::insert_into(users::table)
                .values(&NewUser {
                    username,
                    password_hash: &password_hash,
                })
                .returning(User::as_returning())
                .get_result(conn)?;

            diesel::insert_into(profiles::table)
                .values(&NewProfile {
                    user_id: user.id,
                    is_creator: role == Role::Creator,
                    is_viewer: role == Role::Viewer,
                })
                .execute(conn)?;

            issue_token_pair(
                conn,
                user.id,
                config.access_token_ttl,
                config.refresh_token_ttl,
            )
        })
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                ApiError::field("username", "A user with that username already exists.")
            }
            other => other.into(),
        })?;

    tracing::info!(username = %username, role = ?role, "Created user");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            access_token: tokens.access,
            refresh_token: tokens.refresh,
        }),
    ))
}
