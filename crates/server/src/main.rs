//! postgrid server entry point.
//!
//! Boots the HTTP surface over the shared cache database. Logging goes to
//! stderr as JSON.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use postgrid_core::{AppConfig, CacheDb};
use postgrid_query::{Extensions, JsonContentSource, PostGrid};
use tracing_subscriber::EnvFilter;

mod auth;
mod error;
mod handlers;
mod middleware;
mod routes;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
    let source = JsonContentSource::load(&config.content_path)
        .await
        .with_context(|| format!("loading content from {}", config.content_path.display()))?;

    let bind_addr: SocketAddr = config.bind_addr.parse().context("parsing bind_addr")?;
    let grid = Arc::new(PostGrid::new(config, db, Arc::new(source), Extensions::new()));

    spawn_purge_task(grid.clone());

    let app = routes::build_router(state::AppState::new(grid));
    let listener = tokio::net::TcpListener::bind(bind_addr).await.with_context(|| format!("binding {bind_addr}"))?;

    tracing::info!(addr = %bind_addr, "Starting postgrid server");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("postgrid server stopped");
    Ok(())
}

/// Periodically drop expired cache entries and rate windows.
fn spawn_purge_task(grid: Arc<PostGrid>) {
    let Some(period) = grid.config().purge_interval() else {
        tracing::info!("expired-entry purge disabled");
        return;
    };

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let (entries, windows) = grid.purge_expired().await;
            if entries > 0 || windows > 0 {
                tracing::info!(entries, windows, "purged expired rows");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
