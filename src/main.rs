//! tagcache - cache host process
//!
//! Runs a cache instance with its background tasks until shutdown, restoring
//! and saving a snapshot file when `SNAPSHOT_PATH` is set.

use std::path::Path;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagcache::{snapshot, CacheConfig, CacheService};

/// Main entry point for the cache host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache service
/// 4. Restore the snapshot, if one is configured and present
/// 5. Start background cleanup and stats tasks
/// 6. Wait for SIGINT/SIGTERM, then stop tasks and save the snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagcache=info,audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tagcache");

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: default_ttl={}s, max_memory={}, cleanup_interval={}s, stats_interval={}s",
        config.default_ttl, config.max_memory, config.cleanup_interval, config.stats_interval
    );
    let snapshot_path = config.snapshot_path.clone();

    let cache = CacheService::new(config);

    if let Some(path) = snapshot_path.as_deref().filter(|p| Path::new(p).exists()) {
        match snapshot::load(path) {
            Ok(entries) => {
                let restored = cache.import(entries).await;
                info!("Restored {} entries from {}", restored, path);
            }
            Err(e) => warn!("Ignoring unreadable snapshot {}: {}", path, e),
        }
    }

    let tasks = cache.start();
    info!("Background tasks started");

    shutdown_signal().await?;
    tasks.shutdown();

    if let Some(path) = snapshot_path.as_deref() {
        let entries = cache.export().await;
        snapshot::save(path, &entries).with_context(|| format!("writing snapshot {}", path))?;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("installing SIGTERM handler")?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.context("installing Ctrl+C handler")?;
                info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.context("installing Ctrl+C handler")?;
        info!("Received Ctrl+C, initiating shutdown...");
    }

    Ok(())
}
