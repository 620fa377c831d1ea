use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use clipstream_core::api_types::ApiResponse;
use clipstream_core::comments::Comment;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};
use crate::users::middleware::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<Vec<Comment>>>> {
    let comments = state
        .comments
        .list_for_video(
            video_id,
            params.page.unwrap_or(1),
            params.limit.unwrap_or(10),
        )
        .await?;

    Ok(Json(ApiResponse::success(comments).with_message("Video comments fetched")))
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub content: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<Uuid>,
    Json(request): Json<AddCommentRequest>,
) -> AppResult<impl IntoResponse> {
    if request.content.trim().is_empty() {
        return Err(AppError::bad_request("Content is required"));
    }

    // The comment must land on a watchable video.
    state
        .videos
        .find_published(video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    let comment = state
        .comments
        .create(video_id, current.id, request.content.trim())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(comment).with_message("Commented")),
    ))
}
