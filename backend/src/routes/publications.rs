//! Publication and feed routes
//!
//! All routes here require authentication.

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{FeedQuery, PublicationService};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use devbook_shared::{Publication, PublicationRequest};

/// Create publication routes
pub fn publication_routes() -> Router<AppState> {
    Router::new()
        .route("/publications", post(create_publication).get(get_feed))
        .route(
            "/publications/:id",
            get(get_publication)
                .put(update_publication)
                .delete(delete_publication),
        )
        .route("/publications/:id/like", post(like_publication))
        .route("/publications/:id/dislike", post(dislike_publication))
}

/// POST /api/v1/publications
async fn create_publication(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<PublicationRequest>,
) -> ApiResult<(StatusCode, Json<Publication>)> {
    let publication = PublicationService::create(&state.db, caller.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(publication)))
}

/// The caller's feed
///
/// GET /api/v1/publications
async fn get_feed(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<Vec<Publication>>> {
    let feed = FeedQuery::get_feed(&state.db, caller.user_id).await?;
    Ok(Json(feed))
}

/// GET /api/v1/publications/:id
async fn get_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Publication>> {
    let publication = PublicationService::get(&state.db, id).await?;
    Ok(Json(publication))
}

/// PUT /api/v1/publications/:id
async fn update_publication(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<PublicationRequest>,
) -> ApiResult<StatusCode> {
    PublicationService::update(&state.db, caller.user_id, id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/publications/:id
async fn delete_publication(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    PublicationService::delete(&state.db, caller.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn like_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    PublicationService::like(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn dislike_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    PublicationService::dislike(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
