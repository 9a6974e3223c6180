//! Dirwatch binary
//!
//! Wires up:
//! - the polling scanner over `WATCH_DIR`
//! - the broadcaster fanning changes out to subscribers
//! - the HTTP/SSE surface

use dirwatch::adapters::http::{self, AppState};
use dirwatch::{Broadcaster, Scanner, WatchConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match WatchConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!(error = ?e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let broadcaster = Arc::new(Broadcaster::new(config.event_buffer));
    let shutdown = CancellationToken::new();

    // 1. Scanner
    let scanner = Scanner::new(config.watch_dir.clone(), broadcaster.clone());
    let scanner_task = tokio::spawn(scanner.run(config.scan_interval, shutdown.clone()));

    // 2. Ctrl-C ends the streams first so graceful shutdown is not held open
    tokio::spawn({
        let broadcaster = broadcaster.clone();
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = ?e, "Failed to listen for shutdown signal");
                return;
            }
            info!("Shutting down");
            broadcaster.shutdown();
            shutdown.cancel();
        }
    });

    // 3. HTTP
    let state = AppState {
        broadcaster: broadcaster.clone(),
        config: config.clone(),
    };
    if let Err(e) = http::serve(state, shutdown.clone()).await {
        error!(error = ?e, "Error starting server");
        std::process::exit(1);
    }

    broadcaster.shutdown();
    shutdown.cancel();
    if let Err(e) = scanner_task.await {
        error!(error = ?e, "Scanner task failed");
    }
}
