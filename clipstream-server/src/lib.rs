//! # Clipstream Server
//!
//! REST backend for a media-sharing platform: upload, browse, comment,
//! like, subscribe, and playlist endpoints over a dual-token auth core.
//!
//! ## Architecture
//!
//! The server is built on Axum and uses:
//! - PostgreSQL for persistent storage
//! - Short-lived JWT access tokens and rotated long-lived refresh tokens
//! - An external object host for video, thumbnail, and avatar assets

use axum::{
    Json, Router,
    http::{HeaderValue, StatusCode},
    routing::get,
};
use serde_json::json;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub mod comments;
pub mod infra;
pub mod likes;
pub mod playlists;
pub mod posts;
pub mod routes;
pub mod subscriptions;
pub mod users;
pub mod videos;

pub use infra::app_state::AppState;

/// Assemble the full application router.
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", routes::v1::create_v1_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
