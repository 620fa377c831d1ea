use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipstream_core::media::HttpMediaHost;
use clipstream_server::{create_app, infra::app_state::AppState, infra::config::Config};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "clipstream-server")]
#[command(about = "REST backend for the clipstream media-sharing platform")]
struct Cli {
    /// Bind address override
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Port override
    #[arg(long, env = "SERVER_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.server_host = host;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    config.ensure_directories()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    let media_host = Arc::new(HttpMediaHost::new(
        config.media_host_url.clone(),
        config.media_host_api_key.clone(),
    ));

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid server host/port")?;

    let state = AppState::new(config, pool, media_host);
    let app = create_app(state);

    info!("Starting clipstream server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
