use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;
use uuid::Uuid;

use clipstream_core::api_types::ApiResponse;
use clipstream_core::likes::LikeTarget;
use clipstream_core::videos::Video;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};
use crate::users::middleware::CurrentUser;

#[derive(Debug, Serialize)]
pub struct LikeStatus {
    pub liked: bool,
}

pub async fn toggle_video_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LikeStatus>>> {
    state
        .videos
        .find_by_id(video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    let liked = state
        .likes
        .toggle(current.id, LikeTarget::Video(video_id))
        .await?;

    Ok(Json(ApiResponse::success(LikeStatus { liked })))
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(comment_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LikeStatus>>> {
    state
        .comments
        .find_by_id(comment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;

    let liked = state
        .likes
        .toggle(current.id, LikeTarget::Comment(comment_id))
        .await?;

    Ok(Json(ApiResponse::success(LikeStatus { liked })))
}

pub async fn toggle_post_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(post_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LikeStatus>>> {
    state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    let liked = state
        .likes
        .toggle(current.id, LikeTarget::Post(post_id))
        .await?;

    Ok(Json(ApiResponse::success(LikeStatus { liked })))
}

pub async fn liked_videos(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<Video>>>> {
    let videos = state.likes.liked_videos(current.id).await?;

    Ok(Json(ApiResponse::success(videos).with_message("Liked videos fetched")))
}
