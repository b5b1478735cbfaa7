pub mod auth;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-user/", post(auth::create_user::create_user))
        .route("/api/token/", post(auth::token::obtain_token))
        .route("/api/token/refresh/", post(auth::refresh::refresh_token))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::create_user::create_user,
        auth::token::obtain_token,
        auth::refresh::refresh_token,
    ),
    components(schemas(
        auth::create_user::CreateUserRequest,
        auth::create_user::CreateUserResponse,
        auth::token::TokenRequest,
        auth::token::TokenResponse,
        auth::refresh::RefreshRequest,
        auth::refresh::RefreshResponse,
    ))
)]
pub struct ApiDoc;
