//! Lesson Studio · host binary
//!
//! - Axum HTTP + WebSocket surface for the browser page
//! - Talks to the remote content API for lesson generation and adaptation
//! - Static page fallback (./static/index.html)
//!
//! Important env variables:
//!   STUDIO_CONFIG_PATH      : path to TOML config (API location + seed prompt configs)
//!   LESSON_API_BASE_URL     : content API origin (default "http://127.0.0.1:5001")
//!   LESSON_API_TIMEOUT_SECS : optional client timeout; unset keeps the transport default
//!   PORT                    : u16 (default 3000)
//!   LOG_LEVEL               : tracing filter, e.g. "debug" or full directives
//!   STUDIO_LOG              : extra directives for studio targets, e.g. "workflow=trace"
//!   LOG_FORMAT              : "pretty" (default), "compact" or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use lesson_studio::config::load_studio_config_from_env;
use lesson_studio::routes::build_router;
use lesson_studio::state::AppState;
use lesson_studio::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    let cfg = load_studio_config_from_env();
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));

    // Shared state: studio workflows, admin store, config.
    let state = Arc::new(AppState::from_config(cfg)?);

    let app = build_router(state.clone());

    let listener = TcpListener::bind(addr).await?;
    info!(target: "lesson_studio", %addr, "HTTP server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!(target: "lesson_studio", "HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "lesson_studio", error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
