//! Staging for multipart file uploads.
//!
//! Incoming files are written to a temp file under the configured staging
//! directory and handed to the media host by path; the temp file guard
//! cleans up regardless of whether the upload succeeds.

use tempfile::NamedTempFile;

use crate::infra::{app_state::AppState, errors::AppError};

pub async fn stage_upload(state: &AppState, data: &[u8]) -> Result<NamedTempFile, AppError> {
    let staged = NamedTempFile::new_in(&state.config.upload_staging_dir)
        .map_err(|err| AppError::internal(format!("failed to stage upload: {err}")))?;

    tokio::fs::write(staged.path(), data)
        .await
        .map_err(|err| AppError::internal(format!("failed to stage upload: {err}")))?;

    Ok(staged)
}
