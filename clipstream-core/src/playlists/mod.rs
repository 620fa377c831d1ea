//! User-curated playlists of videos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A playlist together with the ids of the videos it holds, in insertion
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistWithVideos {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub videos: Vec<Uuid>,
}

/// Outcome of an add/remove membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Changed,
    AlreadyAsRequested,
}

pub struct PlaylistRepository {
    pool: PgPool,
}

impl fmt::Debug for PlaylistRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaylistRepository").finish()
    }
}

const PLAYLIST_COLUMNS: &str = "id, owner_id, name, description, created_at, updated_at";

impl PlaylistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
        first_video: Uuid,
    ) -> Result<PlaylistWithVideos> {
        let playlist = sqlx::query_as::<_, Playlist>(&format!(
            "INSERT INTO playlists (id, owner_id, name, description) VALUES ($1, $2, $3, $4) \
             RETURNING {PLAYLIST_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query("INSERT INTO playlist_videos (playlist_id, video_id) VALUES ($1, $2)")
            .bind(playlist.id)
            .bind(first_video)
            .execute(&self.pool)
            .await?;

        Ok(PlaylistWithVideos {
            playlist,
            videos: vec![first_video],
        })
    }

    pub async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<PlaylistWithVideos>> {
        let playlists = sqlx::query_as::<_, Playlist>(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            let videos = self.video_ids(playlist.id).await?;
            result.push(PlaylistWithVideos { playlist, videos });
        }

        Ok(result)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PlaylistWithVideos>> {
        let playlist = sqlx::query_as::<_, Playlist>(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match playlist {
            Some(playlist) => {
                let videos = self.video_ids(playlist.id).await?;
                Ok(Some(PlaylistWithVideos { playlist, videos }))
            }
            None => Ok(None),
        }
    }

    pub async fn add_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<MembershipChange> {
        let result = sqlx::query(
            "INSERT INTO playlist_videos (playlist_id, video_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(MembershipChange::Changed)
        } else {
            Ok(MembershipChange::AlreadyAsRequested)
        }
    }

    pub async fn remove_video(
        &self,
        playlist_id: Uuid,
        video_id: Uuid,
    ) -> Result<MembershipChange> {
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() > 0 {
            Ok(MembershipChange::Changed)
        } else {
            Ok(MembershipChange::AlreadyAsRequested)
        }
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Playlist>> {
        let playlist = sqlx::query_as::<_, Playlist>(&format!(
            "UPDATE playlists SET \
               name = COALESCE($2, name), \
               description = COALESCE($3, description), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PLAYLIST_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(playlist)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Option<Playlist>> {
        let playlist = sqlx::query_as::<_, Playlist>(&format!(
            "DELETE FROM playlists WHERE id = $1 RETURNING {PLAYLIST_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(playlist)
    }

    async fn video_ids(&self, playlist_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT video_id FROM playlist_videos WHERE playlist_id = $1 ORDER BY added_at",
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
