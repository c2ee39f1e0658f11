// src/main.rs

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

mod api;
mod app;
mod config;
mod core;
mod logging;

use app::AppState;
use config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Setup ---
    color_eyre::install()?;
    logging::initialize_logging()?;

    let settings = Settings::from_env();
    let bind_addr = settings.bind_addr.clone();
    info!(
        base_url = %settings.base_url,
        timeout_secs = settings.request_timeout.as_secs(),
        "Starting URL reputation service."
    );

    let state = Arc::new(AppState::new(settings));
    let router = api::router(state);

    // --- Serve ---
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", bind_addr))?;
    info!(addr = %bind_addr, "Listening.");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Server terminated unexpectedly")?;

    info!("Shut down cleanly.");
    Ok(())
}

/// Resolves on Ctrl-C so in-flight requests can finish.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal.");
    }
}
