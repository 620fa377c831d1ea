use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use clipstream_core::auth::AuthError;
use clipstream_core::error::StoreError;
use clipstream_core::media::MediaHostError;

pub type AppResult<T> = Result<T, AppError>;

/// Boundary error: whatever the domain surfaced, flattened to a status code
/// and a client-safe message.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.message,
        }));

        (self.status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::Validation(_) => Self::bad_request(err.to_string()),
            AuthError::UserNotFound => Self::not_found(err.to_string()),
            AuthError::InvalidCredentials => Self::unauthorized(err.to_string()),
            AuthError::TokenInvalid => Self::unauthorized(err.to_string()),
            AuthError::TokenMismatch => Self::unauthorized(err.to_string()),
            AuthError::Store(source) => {
                tracing::error!(error = ?source, "credential store failure");
                Self::internal("Internal server error")
            }
            AuthError::Internal(reason) => {
                tracing::error!(reason, "auth core failure");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound(_) => Self::not_found(err.to_string()),
            StoreError::Conflict(_) => Self::conflict(err.to_string()),
            StoreError::Database(source) => {
                tracing::error!(error = ?source, "database operation failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<MediaHostError> for AppError {
    fn from(err: MediaHostError) -> Self {
        tracing::error!(error = ?err, "media host operation failed");
        Self::internal("Media upload failed")
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = ?err, "database operation failed");
        Self::internal("Internal server error")
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "unhandled failure");
        Self::internal("Internal server error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_the_documented_statuses() {
        let cases = [
            (
                AuthError::Validation("field required".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::TokenInvalid, StatusCode::UNAUTHORIZED),
            (AuthError::TokenMismatch, StatusCode::UNAUTHORIZED),
            (
                AuthError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status, expected);
        }
    }

    #[test]
    fn internal_failures_do_not_leak_details() {
        let err = AppError::from(AuthError::Internal("secret backend path".to_string()));
        assert!(!err.message.contains("secret backend path"));
    }
}
