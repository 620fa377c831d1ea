//! Comments attached to videos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct CommentRepository {
    pool: PgPool,
}

impl fmt::Debug for CommentRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentRepository").finish()
    }
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, video_id: Uuid, owner_id: Uuid, content: &str) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (id, video_id, owner_id, content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, video_id, owner_id, content, created_at, updated_at",
        )
        .bind(Uuid::now_v7())
        .bind(video_id)
        .bind(owner_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    pub async fn list_for_video(
        &self,
        video_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Comment>> {
        let limit = i64::from(limit.clamp(1, 100));
        let offset = i64::from(page.max(1) - 1) * limit;

        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, video_id, owner_id, content, created_at, updated_at \
             FROM comments WHERE video_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(video_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, video_id, owner_id, content, created_at, updated_at \
             FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }
}
