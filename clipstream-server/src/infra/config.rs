use anyhow::Context;
use chrono::Duration;
use clipstream_core::auth::TokenSettings;
use std::{env, path::PathBuf};
use url::Url;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Database settings
    pub database_url: String,

    // CORS settings
    pub cors_allowed_origins: Vec<String>,

    // Development settings: cookies drop the Secure flag so plain HTTP works
    pub dev_mode: bool,

    // Token secrets and lifetimes, one pair per kind
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,

    // External media host
    pub media_host_url: Url,
    pub media_host_api_key: String,

    // Where multipart uploads are staged before being pushed to the host
    pub upload_staging_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let media_host_url = env::var("MEDIA_HOST_URL")
            .context("MEDIA_HOST_URL must be set")?
            .parse::<Url>()
            .context("MEDIA_HOST_URL is not a valid URL")?;

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),

            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),

            dev_mode: env::var("DEV_MODE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),

            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .context("ACCESS_TOKEN_SECRET must be set")?,
            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .context("REFRESH_TOKEN_SECRET must be set")?,
            access_token_ttl_secs: env::var("ACCESS_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900),
            refresh_token_ttl_secs: env::var("REFRESH_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| (30 * 24 * 3600).to_string())
                .parse()
                .unwrap_or(30 * 24 * 3600),

            media_host_url,
            media_host_api_key: env::var("MEDIA_HOST_API_KEY")
                .context("MEDIA_HOST_API_KEY must be set")?,

            upload_staging_dir: env::var("UPLOAD_STAGING_DIR")
                .unwrap_or_else(|_| "./tmp/uploads".to_string())
                .into(),
        })
    }

    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.upload_staging_dir).with_context(|| {
            format!(
                "failed to create upload staging dir {}",
                self.upload_staging_dir.display()
            )
        })?;
        Ok(())
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_secret: self.access_token_secret.clone(),
            refresh_secret: self.refresh_token_secret.clone(),
            access_ttl: Duration::seconds(self.access_token_ttl_secs),
            refresh_ttl: Duration::seconds(self.refresh_token_ttl_secs),
        }
    }
}
