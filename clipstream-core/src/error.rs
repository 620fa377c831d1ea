use thiserror::Error;

/// Failures surfaced by the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),
}

impl StoreError {
    /// Classify a sqlx error, lifting unique-constraint violations into
    /// [`StoreError::Conflict`] so callers can answer 409 instead of 500.
    pub fn on_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(what.to_string());
            }
        }
        StoreError::Database(err)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
