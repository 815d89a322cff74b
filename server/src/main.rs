//! Probe Server – serves the device probe page and echoes request metadata.
//!
//! This binary:
//! 1. Reads configuration from an optional `KEY=VALUE` file (first argument)
//!    and the environment (`PORT`, `HOST`, `STATIC_DIR`)
//! 2. Runs an axum HTTP server that embeds each page request's metadata
//!    into the served HTML, or returns it as JSON for unknown routes.

mod page;
mod server;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "probe_server=info,probe_common=info,tower_http=info".into()),
        )
        .init();

    // ── load config ──────────────────────────────────────────────────
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config =
        probe_common::config::load(config_path.as_deref()).context("Config load failed")?;

    info!(
        "Probe Server starting (listen={}, static={})",
        config.listen_addr(),
        config.static_dir.display()
    );
    if !config.template_path().is_file() {
        warn!(
            "Template {} not found – the root page will answer 500",
            config.template_path().display()
        );
    }
    if !page::client_built(&config.static_dir) {
        warn!(
            "{} missing – run `cargo leptos build --release` to build the browser client",
            config.static_dir.join(page::CLIENT_MODULE).display()
        );
    }

    // ── ctrl-c ───────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_flag.store(true, Ordering::Relaxed);
        info!("Shutdown signal received");
    })
    .context("Cannot set Ctrl-C handler")?;

    // ── HTTP server ──────────────────────────────────────────────────
    server::run(&config, shutdown).await?;

    info!("Probe Server stopped");
    Ok(())
}
