pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod seed;

use std::path::Path;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let state = api::create_app_state_from_config(&config).await?;

    // Seeding is fatal on failure: never serve an inconsistent dataset.
    seed::apply(&state.store, Path::new(&config.general.seed_path))
        .await
        .context("seeding the database failed")?;

    let app = api::router(state, &config.server.cors_allowed_origins);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("hackerbase listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            e
        })?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Error listening for shutdown: {e}");
    } else {
        info!("Shutdown signal received");
    }
}
