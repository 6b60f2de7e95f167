//! Bare HTTP listener for hosting-platform health checks.
//!
//! Runs on its own OS thread with a single-threaded runtime so it keeps
//! answering regardless of what the bot dispatcher is doing.

use anyhow::{Context, Result};
use axum::{http::header, response::IntoResponse, routing::get, Router};
use std::thread::JoinHandle;
use tracing::{error, info};

pub const HEALTH_BODY: &str = "Telegram bot is running and healthy!";

/// GET and HEAD on any path. Axum strips the body for HEAD.
pub fn router() -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/{*path}", get(health_check))
}

async fn health_check() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], HEALTH_BODY)
}

/// Serve the health router on `addr` until the process exits.
pub async fn serve(addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind health server to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router())
        .await
        .context("Health server error")
}

/// Start the health listener on a dedicated background thread.
pub fn spawn(addr: String) -> Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("health".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to build health server runtime: {}", e);
                    return;
                }
            };

            if let Err(e) = runtime.block_on(serve(&addr)) {
                error!("{:#}", e);
            }
        })
        .context("Failed to spawn health server thread")
}
