//! External media-host collaborator.
//!
//! Avatars, thumbnails, and video files are never served from this process;
//! they are pushed to a remote object host which answers with a public URL.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum MediaHostError {
    #[error("failed to read media file: {0}")]
    Io(#[from] std::io::Error),

    #[error("media host request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media host rejected the upload: {0}")]
    Rejected(String),
}

/// What the host hands back for a stored asset.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    /// Playback length in seconds; present for video assets only.
    pub duration: Option<f64>,
}

/// Contract for the remote object/image host.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, local_path: &Path) -> Result<UploadedMedia, MediaHostError>;

    async fn delete(&self, public_id: &str) -> Result<(), MediaHostError>;
}

/// HTTP implementation speaking the host's multipart upload API.
pub struct HttpMediaHost {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for HttpMediaHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMediaHost")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpMediaHost {
    pub fn new(base_url: Url, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl MediaHost for HttpMediaHost {
    async fn upload(&self, local_path: &Path) -> Result<UploadedMedia, MediaHostError> {
        let bytes = tokio::fs::read(local_path).await?;
        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        let form =
            multipart::Form::new().part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let endpoint = self
            .base_url
            .join("upload")
            .map_err(|err| MediaHostError::Rejected(err.to_string()))?;

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaHostError::Rejected(format!(
                "status {}",
                response.status()
            )));
        }

        Ok(response.json::<UploadedMedia>().await?)
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaHostError> {
        let endpoint = self
            .base_url
            .join(&format!("assets/{public_id}"))
            .map_err(|err| MediaHostError::Rejected(err.to_string()))?;

        let response = self
            .client
            .delete(endpoint)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaHostError::Rejected(format!(
                "status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
