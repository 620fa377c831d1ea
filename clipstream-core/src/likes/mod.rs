//! Likes on videos, comments, and posts.
//!
//! A like row references exactly one target; the schema enforces this with
//! a check constraint plus one partial unique index per target column.

use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

use crate::error::Result;
use crate::videos::Video;

/// The single thing a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
    Post(Uuid),
}

impl LikeTarget {
    fn column(self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video_id",
            LikeTarget::Comment(_) => "comment_id",
            LikeTarget::Post(_) => "post_id",
        }
    }

    fn id(self) -> Uuid {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Post(id) => id,
        }
    }
}

pub struct LikeRepository {
    pool: PgPool,
}

impl fmt::Debug for LikeRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LikeRepository").finish()
    }
}

impl LikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Like the target if the user has not, unlike it if they have.
    /// Returns whether the target is liked afterwards.
    pub async fn toggle(&self, user_id: Uuid, target: LikeTarget) -> Result<bool> {
        let column = target.column();

        let deleted = sqlx::query(&format!(
            "DELETE FROM likes WHERE liked_by = $1 AND {column} = $2"
        ))
        .bind(user_id)
        .bind(target.id())
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        // Nothing to remove: this is a fresh like. A concurrent duplicate
        // insert is absorbed by the partial unique index.
        sqlx::query(&format!(
            "INSERT INTO likes (id, liked_by, {column}) VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING"
        ))
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(target.id())
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// All published videos the user has liked, newest like first.
    pub async fn liked_videos(&self, user_id: Uuid) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT v.id, v.owner_id, v.title, v.description, v.video_url, v.thumbnail_url, \
                    v.thumbnail_public_id, v.duration, v.views, v.is_published, v.created_at, v.updated_at \
             FROM likes l \
             JOIN videos v ON v.id = l.video_id \
             WHERE l.liked_by = $1 AND l.video_id IS NOT NULL \
             ORDER BY l.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }
}
