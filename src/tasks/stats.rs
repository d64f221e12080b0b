//! Statistics Logging Task
//!
//! Periodically logs a one-line summary of cache performance.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::CacheStore;

/// Spawns a background task that logs cache statistics every `interval`.
pub fn spawn_stats_task(cache: Arc<Mutex<CacheStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Cache performance monitoring started ({:?} interval)", interval);

        loop {
            tokio::time::sleep(interval).await;

            let stats = cache.lock().await.stats();
            info!(
                "Cache performance: {}% hit rate, {} keys, {} bytes, {} ops/sec",
                stats.hit_rate, stats.total_keys, stats.used_memory, stats.operations_per_second
            );
        }
    })
}
