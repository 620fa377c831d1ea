//! HTTP-level checks of the auth boundary that hold before any database
//! work happens: missing credentials, malformed tokens, and input
//! validation are all decided without a store round-trip, so these run
//! against a lazily connected pool and a stub media host.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use clipstream_core::media::{MediaHost, MediaHostError, UploadedMedia};
use clipstream_server::{create_app, infra::app_state::AppState, infra::config::Config};

struct NullMediaHost;

#[async_trait]
impl MediaHost for NullMediaHost {
    async fn upload(&self, _local_path: &Path) -> Result<UploadedMedia, MediaHostError> {
        Err(MediaHostError::Rejected("unavailable in tests".to_string()))
    }

    async fn delete(&self, _public_id: &str) -> Result<(), MediaHostError> {
        Ok(())
    }
}

fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: "postgres://unused".to_string(),
        cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        dev_mode: true,
        access_token_secret: "test-access-secret".to_string(),
        refresh_token_secret: "test-refresh-secret".to_string(),
        access_token_ttl_secs: 900,
        refresh_token_ttl_secs: 30 * 24 * 3600,
        media_host_url: "https://media.example/".parse().unwrap(),
        media_host_api_key: "test-key".to_string(),
        upload_staging_dir: PathBuf::from("./tmp/uploads"),
    }
}

fn test_app() -> axum::Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/never-connected")
        .expect("lazy pool");

    let state = AppState::new(test_config(), pool, Arc::new(NullMediaHost));
    create_app(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_answers_without_auth() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_tokens() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn protected_routes_reject_garbage_bearer_tokens() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/users/current-user")
                .header("authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_with_a_malformed_token_is_unauthorized() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/refresh-token")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"refreshToken": "not-a-real-token"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn refresh_without_any_token_is_unauthorized() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/refresh-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_requires_an_identifier() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/login")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"password": "hunter2"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "username or email is required");
}
