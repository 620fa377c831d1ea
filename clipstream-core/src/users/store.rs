//! Credential-store contract and its Postgres implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::users::{NewUser, User};

/// Result of a compare-and-set on the stored refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The stored value matched the expectation and was replaced.
    Updated,
    /// The stored value no longer matched; nothing was written.
    Conflict,
}

/// Persistence contract consumed by the session core.
///
/// `swap_refresh_token` must be atomic: the replacement happens only if the
/// currently stored value equals `expected`. This is the single concurrency
/// primitive refresh rotation relies on; two concurrent rotations of the
/// same token must resolve to exactly one [`SwapOutcome::Updated`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up an account by username or email.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Insert a new account. Duplicate username or email surfaces as
    /// [`StoreError::Conflict`].
    async fn create(&self, new_user: NewUser) -> Result<User>;

    /// Atomically replace the stored refresh token, but only if it still
    /// equals `expected` (`None` meaning no active session).
    async fn swap_refresh_token<'a>(
        &self,
        id: Uuid,
        expected: Option<&'a str>,
        new: Option<&'a str>,
    ) -> Result<SwapOutcome>;

    /// Unconditionally overwrite the stored refresh token. Used where the
    /// last write is allowed to win: fresh logins and idempotent logout.
    async fn store_refresh_token<'a>(&self, id: Uuid, token: Option<&'a str>) -> Result<()>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()>;
}

const USER_COLUMNS: &str = "id, username, email, full_name, avatar_url, cover_image_url, \
     password_hash, refresh_token, created_at, updated_at";

pub struct PostgresUserStore {
    pool: PgPool,
}

impl fmt::Debug for PostgresUserStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresUserStore").finish()
    }
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, full_name, avatar_url, cover_image_url, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(new_user.username.to_lowercase())
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(&new_user.avatar_url)
        .bind(new_user.cover_image_url.as_deref())
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| StoreError::on_insert(err, "user"))?;

        Ok(user)
    }

    async fn swap_refresh_token<'a>(
        &self,
        id: Uuid,
        expected: Option<&'a str>,
        new: Option<&'a str>,
    ) -> Result<SwapOutcome> {
        // Single-statement conditional update; Postgres guarantees the
        // read-compare-write is atomic per row.
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $3, updated_at = NOW() \
             WHERE id = $1 AND refresh_token IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(SwapOutcome::Updated)
        } else {
            Ok(SwapOutcome::Conflict)
        }
    }

    async fn store_refresh_token<'a>(&self, id: Uuid, token: Option<&'a str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("user".to_string()));
        }

        Ok(())
    }
}
