use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;
use uuid::Uuid;

use clipstream_core::api_types::ApiResponse;
use clipstream_core::subscriptions::Subscription;
use clipstream_core::users::store::UserStore;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};
use crate::users::middleware::CurrentUser;

#[derive(Debug, Serialize)]
pub struct SubscriptionStatus {
    pub subscribed: bool,
}

pub async fn toggle_subscription(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SubscriptionStatus>>> {
    if channel_id == current.id {
        return Err(AppError::bad_request("Cannot subscribe to your own channel"));
    }

    state
        .users
        .find_by_id(channel_id)
        .await?
        .ok_or_else(|| AppError::not_found("Channel does not exist"))?;

    let subscribed = state.subscriptions.toggle(current.id, channel_id).await?;

    let message = if subscribed {
        "Channel subscribed"
    } else {
        "Channel unsubscribed"
    };

    Ok(Json(
        ApiResponse::success(SubscriptionStatus { subscribed }).with_message(message),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberListing {
    pub subscribers: Vec<Subscription>,
    pub count: i64,
}

pub async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SubscriberListing>>> {
    let subscribers = state.subscriptions.subscribers_of(channel_id).await?;
    let count = subscribers.len() as i64;

    Ok(Json(
        ApiResponse::success(SubscriberListing { subscribers, count })
            .with_message("Subscribers fetched"),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannelListing {
    pub channels: Vec<Subscription>,
    pub count: i64,
}

pub async fn subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SubscribedChannelListing>>> {
    let channels = state.subscriptions.subscribed_channels(subscriber_id).await?;
    let count = channels.len() as i64;

    Ok(Json(
        ApiResponse::success(SubscribedChannelListing { channels, count })
            .with_message("Subscribed channels fetched"),
    ))
}
