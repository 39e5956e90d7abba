//! User and follow graph routes
//!
//! All routes here require authentication; the caller's identity comes
//! from `AuthUser`, never from the path or body.

use crate::auth::{AuthUser, UserId};
use crate::error::ApiResult;
use crate::services::{PublicationService, UserService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use devbook_shared::{
    Publication, UpdatePasswordRequest, UpdateUserRequest, UserProfile, UserSearchQuery,
};

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(search_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/follow", post(follow_user))
        .route("/users/:id/unfollow", delete(unfollow_user))
        .route("/users/:id/followers", get(list_followers))
        .route("/users/:id/following", get(list_following))
        .route("/users/:id/updatePassword", post(update_password))
        .route("/users/:id/publications", get(list_user_publications))
}

/// GET /api/v1/users?search=
async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    let users = UserService::search(&state.db, query.search.as_deref()).await?;
    Ok(Json(users))
}

/// GET /api/v1/users/:id
async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<UserProfile>> {
    let user = UserService::get(&state.db, user_id).await?;
    Ok(Json(user))
}

/// PUT /api/v1/users/:id
async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<UserId>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<StatusCode> {
    UserService::update(&state.db, caller.user_id, user_id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/users/:id
async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<UserId>,
) -> ApiResult<StatusCode> {
    UserService::delete(&state.db, caller.user_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/users/:id/follow
async fn follow_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<UserId>,
) -> ApiResult<StatusCode> {
    UserService::follow(&state.db, caller.user_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/users/:id/unfollow
async fn unfollow_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<UserId>,
) -> ApiResult<StatusCode> {
    UserService::unfollow(&state.db, caller.user_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_followers(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    let users = UserService::followers(&state.db, user_id).await?;
    Ok(Json(users))
}

async fn list_following(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    let users = UserService::following(&state.db, user_id).await?;
    Ok(Json(users))
}

/// POST /api/v1/users/:id/updatePassword
async fn update_password(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<UserId>,
    Json(req): Json<UpdatePasswordRequest>,
) -> ApiResult<StatusCode> {
    UserService::update_password(&state.db, state.passwords(), caller.user_id, user_id, req)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/users/:id/publications
async fn list_user_publications(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<Vec<Publication>>> {
    let publications = PublicationService::by_author(&state.db, user_id).await?;
    Ok(Json(publications))
}
