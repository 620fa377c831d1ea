//! Video catalog: published media entries and their listing queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    #[serde(skip_serializing, default)]
    pub thumbnail_public_id: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub thumbnail_public_id: String,
    pub duration: f64,
}

#[derive(Debug, Clone, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<(String, String)>,
}

/// Sort keys the listing endpoint accepts. Anything else falls back to
/// creation time, which keeps the ORDER BY clause a fixed set of strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSort {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSort {
    fn column(self) -> &'static str {
        match self {
            VideoSort::CreatedAt => "created_at",
            VideoSort::Views => "views",
            VideoSort::Duration => "duration",
            VideoSort::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VideoListQuery {
    pub page: u32,
    pub limit: u32,
    pub text: Option<String>,
    pub sort_by: VideoSort,
    pub sort_direction: SortDirection,
    pub owner_id: Option<Uuid>,
}

impl Default for VideoListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            text: None,
            sort_by: VideoSort::default(),
            sort_direction: SortDirection::default(),
            owner_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VideoPage {
    pub items: Vec<Video>,
    pub total: i64,
}

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_url, thumbnail_url, \
     thumbnail_public_id, duration, views, is_published, created_at, updated_at";

pub struct VideoRepository {
    pool: PgPool,
}

impl fmt::Debug for VideoRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoRepository").finish()
    }
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_video: NewVideo) -> Result<Video> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "INSERT INTO videos (id, owner_id, title, description, video_url, thumbnail_url, thumbnail_public_id, duration) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(new_video.owner_id)
        .bind(&new_video.title)
        .bind(&new_video.description)
        .bind(&new_video.video_url)
        .bind(&new_video.thumbnail_url)
        .bind(&new_video.thumbnail_public_id)
        .bind(new_video.duration)
        .fetch_one(&self.pool)
        .await?;

        Ok(video)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>> {
        let video =
            sqlx::query_as::<_, Video>(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(video)
    }

    /// Fetch a video for public viewing; unpublished entries stay hidden.
    pub async fn find_published(&self, id: Uuid) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1 AND is_published = TRUE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    pub async fn list(&self, query: &VideoListQuery) -> Result<VideoPage> {
        let limit = i64::from(query.limit.clamp(1, 100));
        let offset = i64::from(query.page.max(1) - 1) * limit;
        let pattern = query.text.as_ref().map(|text| format!("%{text}%"));

        // Sort column and direction come from closed enums, never from the
        // raw request, so splicing them into the statement is safe.
        let statement = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos \
             WHERE is_published = TRUE \
               AND ($1::text IS NULL OR title ILIKE $1 OR description ILIKE $1) \
               AND ($2::uuid IS NULL OR owner_id = $2) \
             ORDER BY {} {} \
             LIMIT $3 OFFSET $4",
            query.sort_by.column(),
            query.sort_direction.keyword(),
        );

        let items = sqlx::query_as::<_, Video>(&statement)
            .bind(pattern.as_deref())
            .bind(query.owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM videos \
             WHERE is_published = TRUE \
               AND ($1::text IS NULL OR title ILIKE $1 OR description ILIKE $1) \
               AND ($2::uuid IS NULL OR owner_id = $2)",
        )
        .bind(pattern.as_deref())
        .bind(query.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(VideoPage { items, total })
    }

    pub async fn update(&self, id: Uuid, changes: VideoChanges) -> Result<Option<Video>> {
        let (thumbnail_url, thumbnail_public_id) = match &changes.thumbnail {
            Some((url, public_id)) => (Some(url.as_str()), Some(public_id.as_str())),
            None => (None, None),
        };

        let video = sqlx::query_as::<_, Video>(&format!(
            "UPDATE videos SET \
               title = COALESCE($2, title), \
               description = COALESCE($3, description), \
               thumbnail_url = COALESCE($4, thumbnail_url), \
               thumbnail_public_id = COALESCE($5, thumbnail_public_id), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(thumbnail_url)
        .bind(thumbnail_public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "DELETE FROM videos WHERE id = $1 RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// Flip the publish flag and return the new value.
    pub async fn toggle_publish(&self, id: Uuid) -> Result<Option<bool>> {
        let is_published: Option<bool> = sqlx::query_scalar(
            "UPDATE videos SET is_published = NOT is_published, updated_at = NOW() \
             WHERE id = $1 RETURNING is_published",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(is_published)
    }
}
