use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::models::{Profile, User};
use crate::schema::profiles;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use diesel::prelude::*;
use recipeshare_core::{Principal, Roles};
use std::sync::Arc;

use super::db::get_user_from_token;

/// Extractor that validates the Authorization header and provides the authenticated user.
///
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> impl IntoResponse {
///     // user is the authenticated User
/// }
/// ```
pub struct AuthUser(pub User);

#[derive(Debug)]
pub enum AuthError {
    MissingHeader,
    InvalidHeader,
    InvalidFormat,
    InvalidToken,
    ProfileNotFound,
    Unavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingHeader => (StatusCode::UNAUTHORIZED, "Missing Authorization header"),
            AuthError::InvalidHeader => (StatusCode::UNAUTHORIZED, "Invalid Authorization header"),
            AuthError::InvalidFormat => (
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header format",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::ProfileNotFound => (StatusCode::NOT_FOUND, "Profile not found"),
            AuthError::Unavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database connection failed",
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
                fields: None,
            }),
        )
            .into_response()
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidHeader)?;

    auth_str
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = Arc::<DbPool>::from_ref(state);
        let token = bearer_token(parts)?;

        let mut conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "Failed to get connection for auth");
            AuthError::Unavailable
        })?;

        let user = get_user_from_token(&mut conn, token)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to look up session");
                AuthError::Unavailable
            })?
            .ok_or(AuthError::InvalidToken)?;

        Ok(AuthUser(user))
    }
}

/// Authenticated user together with their profile roles.
///
/// Handlers that make permission decisions take this instead of [`AuthUser`].
/// A user without a profile row is rejected with 404.
pub struct Caller {
    pub user: User,
    pub principal: Principal,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        let pool = Arc::<DbPool>::from_ref(state);

        let mut conn = pool.get().map_err(|_| AuthError::Unavailable)?;
        let profile: Profile = profiles::table
            .filter(profiles::user_id.eq(user.id))
            .select(Profile::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load profile");
                AuthError::Unavailable
            })?
            .ok_or(AuthError::ProfileNotFound)?;

        let principal = Principal::new(
            user.id,
            Roles {
                is_creator: profile.is_creator,
                is_viewer: profile.is_viewer,
            },
        );

        Ok(Caller { user, principal })
    }
}
