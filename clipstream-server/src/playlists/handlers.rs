use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use clipstream_core::api_types::ApiResponse;
use clipstream_core::playlists::{MembershipChange, Playlist, PlaylistWithVideos};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};
use crate::users::middleware::CurrentUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: Option<String>,
    pub video_id: Uuid,
}

pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreatePlaylistRequest>,
) -> AppResult<impl IntoResponse> {
    if request.name.trim().is_empty() {
        return Err(AppError::bad_request("Playlist name is required"));
    }

    state
        .videos
        .find_by_id(request.video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    let playlist = state
        .playlists
        .create(
            current.id,
            request.name.trim(),
            request.description.as_deref(),
            request.video_id,
        )
        .await?;

    let message = format!("Playlist {} created", playlist.playlist.name);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(playlist).with_message(message)),
    ))
}

pub async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<PlaylistWithVideos>>>> {
    let playlists = state.playlists.find_by_owner(user_id).await?;

    Ok(Json(ApiResponse::success(playlists).with_message("Playlists fetched")))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PlaylistWithVideos>>> {
    let playlist = state
        .playlists
        .find_by_id(playlist_id)
        .await?
        .ok_or_else(|| AppError::not_found("Playlist not found"))?;

    Ok(Json(ApiResponse::success(playlist).with_message("Playlist fetched")))
}

/// Load a playlist and check that the caller owns it.
async fn owned_playlist(
    state: &AppState,
    playlist_id: Uuid,
    owner_id: Uuid,
) -> AppResult<PlaylistWithVideos> {
    let playlist = state
        .playlists
        .find_by_id(playlist_id)
        .await?
        .ok_or_else(|| AppError::not_found("Playlist not found"))?;

    if playlist.playlist.owner_id != owner_id {
        return Err(AppError::forbidden("Only the owner may modify this playlist"));
    }

    Ok(playlist)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideoRequest {
    pub video_id: Uuid,
}

pub async fn add_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<Uuid>,
    Json(request): Json<PlaylistVideoRequest>,
) -> AppResult<Json<ApiResponse<PlaylistWithVideos>>> {
    owned_playlist(&state, playlist_id, current.id).await?;

    state
        .videos
        .find_by_id(request.video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    let change = state.playlists.add_video(playlist_id, request.video_id).await?;

    let playlist = state
        .playlists
        .find_by_id(playlist_id)
        .await?
        .ok_or_else(|| AppError::not_found("Playlist not found"))?;

    let message = match change {
        MembershipChange::Changed => "Video added to playlist",
        MembershipChange::AlreadyAsRequested => "Video already exists in playlist",
    };

    Ok(Json(ApiResponse::success(playlist).with_message(message)))
}

pub async fn remove_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<Uuid>,
    Json(request): Json<PlaylistVideoRequest>,
) -> AppResult<Json<ApiResponse<PlaylistWithVideos>>> {
    owned_playlist(&state, playlist_id, current.id).await?;

    let change = state
        .playlists
        .remove_video(playlist_id, request.video_id)
        .await?;

    let playlist = state
        .playlists
        .find_by_id(playlist_id)
        .await?
        .ok_or_else(|| AppError::not_found("Playlist not found"))?;

    let message = match change {
        MembershipChange::Changed => "Video removed from playlist",
        MembershipChange::AlreadyAsRequested => "Video does not exist in playlist",
    };

    Ok(Json(ApiResponse::success(playlist).with_message(message)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub async fn update_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<Uuid>,
    Json(request): Json<UpdatePlaylistRequest>,
) -> AppResult<Json<ApiResponse<Playlist>>> {
    owned_playlist(&state, playlist_id, current.id).await?;

    let playlist = state
        .playlists
        .update(
            playlist_id,
            request.name.as_deref().filter(|name| !name.trim().is_empty()),
            request.description.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Playlist not found"))?;

    Ok(Json(ApiResponse::success(playlist).with_message("Playlist updated")))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Playlist>>> {
    owned_playlist(&state, playlist_id, current.id).await?;

    let playlist = state
        .playlists
        .delete(playlist_id)
        .await?
        .ok_or_else(|| AppError::not_found("Playlist not found"))?;

    Ok(Json(ApiResponse::success(playlist).with_message("Playlist deleted")))
}
