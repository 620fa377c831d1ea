use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use clipstream_core::api_types::ApiResponse;
use clipstream_core::videos::{
    NewVideo, SortDirection, Video, VideoChanges, VideoListQuery, VideoSort,
};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
    uploads::stage_upload,
};
use crate::users::middleware::CurrentUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub sort_by: Option<VideoSort>,
    #[serde(default)]
    pub sort_type: Option<SortDirection>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListing {
    pub videos: Vec<Video>,
    pub total_pages: u32,
    pub current_page: u32,
}

pub async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<VideoListing>>> {
    let query = VideoListQuery {
        page: params.page.unwrap_or(1).max(1),
        limit: params.limit.unwrap_or(10).clamp(1, 100),
        text: params.query.filter(|text| !text.trim().is_empty()),
        sort_by: params.sort_by.unwrap_or_default(),
        sort_direction: params.sort_type.unwrap_or_default(),
        owner_id: params.user_id,
    };

    let page = state.videos.list(&query).await?;
    let total_pages = (page.total as u64).div_ceil(u64::from(query.limit)) as u32;

    Ok(Json(
        ApiResponse::success(VideoListing {
            videos: page.items,
            total_pages,
            current_page: query.page,
        })
        .with_message("Videos fetched"),
    ))
}

/// Fields collected from the publish multipart form.
#[derive(Debug, Default)]
struct PublishForm {
    title: Option<String>,
    description: Option<String>,
    video: Option<NamedTempFile>,
    thumbnail: Option<NamedTempFile>,
}

pub async fn publish_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = PublishForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(field.text().await.unwrap_or_default()),
            "description" => form.description = Some(field.text().await.unwrap_or_default()),
            "video" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                form.video = Some(stage_upload(&state, &data).await?);
            }
            "thumbnail" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                form.thumbnail = Some(stage_upload(&state, &data).await?);
            }
            _ => {}
        }
    }

    let title = form
        .title
        .filter(|title| !title.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("All fields are required"))?;
    let description = form
        .description
        .filter(|description| !description.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("All fields are required"))?;

    let (video_file, thumbnail_file) = match (form.video.as_ref(), form.thumbnail.as_ref()) {
        (Some(video), Some(thumbnail)) => (video, thumbnail),
        _ => return Err(AppError::bad_request("Video and thumbnail files are required")),
    };

    let uploaded_video = state.media_host.upload(video_file.path()).await?;
    let uploaded_thumbnail = state.media_host.upload(thumbnail_file.path()).await?;

    let video = state
        .videos
        .create(NewVideo {
            owner_id: current.id,
            title,
            description,
            video_url: uploaded_video.url,
            thumbnail_url: uploaded_thumbnail.url,
            thumbnail_public_id: uploaded_thumbnail.public_id,
            duration: uploaded_video.duration.unwrap_or(0.0),
        })
        .await?;

    tracing::info!(video_id = %video.id, owner_id = %current.id, "video published");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(video).with_message("Video published")),
    ))
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Video>>> {
    let video = state
        .videos
        .find_published(video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    Ok(Json(ApiResponse::success(video).with_message("Video fetched")))
}

/// Load a video and check that the caller owns it.
async fn owned_video(state: &AppState, video_id: Uuid, owner_id: Uuid) -> AppResult<Video> {
    let video = state
        .videos
        .find_by_id(video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    if video.owner_id != owner_id {
        return Err(AppError::forbidden("Only the owner may modify this video"));
    }

    Ok(video)
}

pub async fn update_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Video>>> {
    let existing = owned_video(&state, video_id, current.id).await?;

    let mut changes = VideoChanges::default();
    let mut new_thumbnail: Option<NamedTempFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => changes.title = Some(field.text().await.unwrap_or_default()),
            "description" => changes.description = Some(field.text().await.unwrap_or_default()),
            "thumbnail" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                new_thumbnail = Some(stage_upload(&state, &data).await?);
            }
            _ => {}
        }
    }

    if let Some(staged) = new_thumbnail.as_ref() {
        let uploaded = state.media_host.upload(staged.path()).await?;
        changes.thumbnail = Some((uploaded.url, uploaded.public_id));
    }

    let updated = state
        .videos
        .update(video_id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    // The superseded thumbnail asset is gone from every view; drop it on
    // the host as well. Failure here must not undo the update.
    if updated.thumbnail_public_id != existing.thumbnail_public_id {
        if let Err(err) = state.media_host.delete(&existing.thumbnail_public_id).await {
            tracing::warn!(error = ?err, "failed to delete replaced thumbnail");
        }
    }

    Ok(Json(ApiResponse::success(updated).with_message("Video updated")))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Video>>> {
    owned_video(&state, video_id, current.id).await?;

    let deleted = state
        .videos
        .delete(video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    Ok(Json(ApiResponse::success(deleted).with_message("Video deleted")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishStatus {
    pub is_published: bool,
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PublishStatus>>> {
    owned_video(&state, video_id, current.id).await?;

    let is_published = state
        .videos
        .toggle_publish(video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    Ok(Json(
        ApiResponse::success(PublishStatus { is_published })
            .with_message("Video publish status changed"),
    ))
}
