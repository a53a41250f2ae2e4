//! Meal Cache - a two-tier local cache
//!
//! Runs the cache with its periodic prune task and serves the admin API.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meal_cache::api::create_router;
use meal_cache::{spawn_prune_task, AppState, Config};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the persistent store and build the cache
/// 4. Start the periodic prune task
/// 5. Serve the admin API until SIGINT/SIGTERM
/// 6. Stop the prune task and dispose of the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meal_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Meal Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_memory_entries={}, default_ttl={}s, dir={}, namespace={}, port={}, prune_interval={}s",
        config.max_memory_entries,
        config.default_ttl,
        config.cache_dir.display(),
        config.namespace,
        config.server_port,
        config.prune_interval
    );

    let state = AppState::from_config(&config).context("failed to open cache store")?;
    let prune_handle = spawn_prune_task(state.cache.clone(), config.prune_interval);

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Admin API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    prune_handle.abort();
    warn!("Prune task aborted");
    let cache = state.cache.clone();
    tokio::task::spawn_blocking(move || cache.dispose())
        .await
        .context("cache dispose task failed")?;

    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
