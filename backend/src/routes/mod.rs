//! Route definitions for the Devbook API
//!
//! This module organizes all API routes and applies middleware.
//!
//! Layer order, outermost first: tracing, request ids, CORS, timeout,
//! compression, then (protected routes only) the interceptor chain.
//! Every request is traced exactly once whether or not it authenticates.

use crate::auth::run_interceptors;
use crate::state::AppState;
use axum::{
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod auth;
mod health;
mod publications;
mod users;


pub use auth::auth_routes;
pub use publications::publication_routes;
pub use users::user_routes;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/api/v1", api_routes(&state))
        // Apply middleware layers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(users::user_routes())
        .merge(publications::publication_routes())
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            run_interceptors,
        ));

    Router::new()
        .route("/", get(|| async { "Devbook API v1" }))
        .merge(auth::auth_routes())
        .merge(protected)
}
