//! Short text posts published on a channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct PostRepository {
    pool: PgPool,
}

impl fmt::Debug for PostRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostRepository").finish()
    }
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, content: &str) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            "INSERT INTO posts (id, owner_id, content) VALUES ($1, $2, $3) \
             RETURNING id, owner_id, content, created_at, updated_at",
        )
        .bind(Uuid::now_v7())
        .bind(owner_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT id, owner_id, content, created_at, updated_at \
             FROM posts WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, owner_id, content, created_at, updated_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn update_content(&self, id: Uuid, content: &str) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "UPDATE posts SET content = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING id, owner_id, content, created_at, updated_at",
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
