use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use clipstream_core::api_types::ApiResponse;
use clipstream_core::auth::TokenPair;
use clipstream_core::users::store::UserStore;
use clipstream_core::users::{NewUser, UserProfile};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
    uploads::stage_upload,
};
use crate::users::cookies::{clear_session_cookies, presented_refresh_token, set_session_cookies};
use crate::users::middleware::CurrentUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<&TokenPair> for TokenPairResponse {
    fn from(tokens: &TokenPair) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(flatten)]
    pub user: UserProfile,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
}

/// Fields collected from the registration multipart form.
#[derive(Debug, Default)]
struct RegistrationForm {
    full_name: Option<String>,
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
    avatar: Option<NamedTempFile>,
    cover_image: Option<NamedTempFile>,
}

async fn collect_registration(
    state: &AppState,
    mut multipart: Multipart,
) -> AppResult<RegistrationForm> {
    let mut form = RegistrationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "fullName" => form.full_name = Some(field.text().await.unwrap_or_default()),
            "email" => form.email = Some(field.text().await.unwrap_or_default()),
            "username" => form.username = Some(field.text().await.unwrap_or_default()),
            "password" => form.password = Some(field.text().await.unwrap_or_default()),
            "avatar" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                form.avatar = Some(stage_upload(state, &data).await?);
            }
            "coverImage" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                form.cover_image = Some(stage_upload(state, &data).await?);
            }
            _ => {}
        }
    }

    Ok(form)
}

pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = collect_registration(&state, multipart).await?;

    let (full_name, email, username, password) = match (
        form.full_name.as_deref(),
        form.email.as_deref(),
        form.username.as_deref(),
        form.password.as_deref(),
    ) {
        (Some(full_name), Some(email), Some(username), Some(password))
            if ![full_name, email, username, password]
                .iter()
                .any(|field| field.trim().is_empty()) =>
        {
            (full_name, email, username, password)
        }
        _ => return Err(AppError::bad_request("All fields are required")),
    };

    let avatar = form
        .avatar
        .as_ref()
        .ok_or_else(|| AppError::bad_request("Avatar file is required"))?;

    let uploaded_avatar = state.media_host.upload(avatar.path()).await?;

    let cover_image_url = match form.cover_image.as_ref() {
        Some(cover) => Some(state.media_host.upload(cover.path()).await?.url),
        None => None,
    };

    let password_hash = state
        .crypto
        .hash_password(password)
        .map_err(|err| AppError::internal(err.to_string()))?;

    let user = state
        .users
        .create(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            avatar_url: uploaded_avatar.url,
            cover_image_url,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(UserProfile::from(&user))
                .with_message("User registered successfully"),
        ),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let identifier = request
        .username_or_email
        .or(request.username)
        .or(request.email)
        .filter(|identifier| !identifier.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("username or email is required"))?;

    if request.password.is_empty() {
        return Err(AppError::bad_request("password is required"));
    }

    let outcome = state.sessions.login(&identifier, &request.password).await?;

    let jar = set_session_cookies(jar, &outcome.tokens, !state.config.dev_mode);
    let body = SessionResponse {
        user: outcome.user,
        access_token: outcome.tokens.access_token.clone(),
        refresh_token: outcome.tokens.refresh_token.clone(),
    };

    Ok((
        jar,
        Json(ApiResponse::success(body).with_message("Logged in successfully")),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    state.sessions.logout(current.id).await?;

    let jar = clear_session_cookies(jar);

    Ok((
        jar,
        Json(ApiResponse::success(serde_json::json!({})).with_message("Logged out")),
    ))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<impl IntoResponse> {
    let body_token = body.as_ref().and_then(|Json(req)| req.refresh_token.clone());

    let presented = presented_refresh_token(&jar, body_token.as_deref())
        .ok_or_else(|| AppError::unauthorized("Unauthorized request"))?;

    let tokens = state.sessions.refresh(&presented).await?;

    let jar = set_session_cookies(jar, &tokens, !state.config.dev_mode);

    Ok((
        jar,
        Json(
            ApiResponse::success(TokenPairResponse::from(&tokens))
                .with_message("Access token refreshed"),
        ),
    ))
}

pub async fn current_user(
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    Ok(Json(ApiResponse::success(current.profile)))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if request.old_password.is_empty() || request.new_password.is_empty() {
        return Err(AppError::bad_request("All fields are required"));
    }

    state
        .sessions
        .change_password(current.id, &request.old_password, &request.new_password)
        .await?;

    Ok(Json(
        ApiResponse::success(serde_json::json!({})).with_message("Password changed"),
    ))
}

pub async fn channel_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> AppResult<Json<ApiResponse<ChannelProfile>>> {
    let user = state
        .users
        .find_by_identifier(&username)
        .await?
        .ok_or_else(|| AppError::not_found("Channel does not exist"))?;

    let subscriber_count = state.subscriptions.subscriber_count(user.id).await?;
    let subscribed_to_count = state.subscriptions.subscribed_count(user.id).await?;
    let is_subscribed = state.subscriptions.is_subscribed(current.id, user.id).await?;

    Ok(Json(ApiResponse::success(ChannelProfile {
        user: UserProfile::from(&user),
        subscriber_count,
        subscribed_to_count,
        is_subscribed,
    })))
}
