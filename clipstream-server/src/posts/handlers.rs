use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use clipstream_core::api_types::ApiResponse;
use clipstream_core::posts::Post;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};
use crate::users::middleware::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct PostContentRequest {
    pub content: String,
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<PostContentRequest>,
) -> AppResult<impl IntoResponse> {
    if request.content.trim().is_empty() {
        return Err(AppError::bad_request("Content is required"));
    }

    let post = state.posts.create(current.id, request.content.trim()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(post).with_message("Post added")),
    ))
}

pub async fn user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Post>>>> {
    let posts = state.posts.list_for_owner(user_id).await?;

    Ok(Json(ApiResponse::success(posts).with_message("Posts fetched")))
}

/// Load a post and check that the caller owns it.
async fn owned_post(state: &AppState, post_id: Uuid, owner_id: Uuid) -> AppResult<Post> {
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    if post.owner_id != owner_id {
        return Err(AppError::forbidden("Only the owner may modify this post"));
    }

    Ok(post)
}

pub async fn update_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(post_id): Path<Uuid>,
    Json(request): Json<PostContentRequest>,
) -> AppResult<Json<ApiResponse<Post>>> {
    if request.content.trim().is_empty() {
        return Err(AppError::bad_request("Content is required"));
    }

    owned_post(&state, post_id, current.id).await?;

    let post = state
        .posts
        .update_content(post_id, request.content.trim())
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    Ok(Json(ApiResponse::success(post).with_message("Post updated")))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(post_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let post = owned_post(&state, post_id, current.id).await?;

    state.posts.delete(post.id).await?;

    Ok(Json(
        ApiResponse::success(serde_json::json!({})).with_message("Post deleted"),
    ))
}
