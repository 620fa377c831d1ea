//! Per-request identity.
//!
//! Identity is derived strictly from verifying the presented access token;
//! there is no shared logged-in state anywhere in the process. Handlers
//! downstream read the typed [`CurrentUser`] extension.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use clipstream_core::users::UserProfile;
use clipstream_core::users::store::UserStore;

use crate::infra::{app_state::AppState, errors::AppError};
use crate::users::cookies::presented_access_token;

/// The authenticated caller, resolved once per request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub profile: UserProfile,
}

pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = presented_access_token(auth_header, &jar)
        .ok_or_else(|| AppError::unauthorized("Unauthorized request"))?;

    let claims = state.sessions.verify_access(&token)?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid access token"))?;

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        profile: UserProfile::from(&user),
    });

    Ok(next.run(request).await)
}
