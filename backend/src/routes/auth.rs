//! Public account routes
//!
//! Registration and login are the only API routes reachable without a
//! bearer token.
//!
//! Password hashing runs on the blocking thread pool and tokens are
//! signed with the keys cached in `AppState`.

use crate::error::ApiResult;
use crate::services::UserService;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use devbook_shared::{AuthData, LoginRequest, RegisterRequest, UserProfile};

/// Create public auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/login", post(login))
}

/// Register a new user
///
/// POST /api/v1/users
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let user = UserService::register(&state.db, state.passwords(), req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with email and password
///
/// POST /api/v1/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthData>> {
    let auth = UserService::login(&state.db, state.passwords(), state.tokens(), req).await?;
    Ok(Json(auth))
}
