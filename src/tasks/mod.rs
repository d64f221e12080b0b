//! Background Tasks Module
//!
//! Periodic work scoped to a cache instance.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired cache entries at configured intervals
//! - Stats Logging: Logs hit rate, key count and throughput

mod cleanup;
mod stats;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::CacheStore;

pub use cleanup::spawn_cleanup_task;
pub use stats::spawn_stats_task;

// == Background Tasks ==
/// Owns the cache's background tasks; dropping it aborts them.
#[derive(Debug)]
pub struct BackgroundTasks {
    cleanup: JoinHandle<()>,
    stats: JoinHandle<()>,
}

impl BackgroundTasks {
    /// Spawns both tasks on the current tokio runtime.
    pub fn spawn(cache: Arc<Mutex<CacheStore>>, cleanup_interval: Duration, stats_interval: Duration) -> Self {
        Self {
            cleanup: spawn_cleanup_task(cache.clone(), cleanup_interval),
            stats: spawn_stats_task(cache, stats_interval),
        }
    }

    /// Stops both tasks.
    pub fn shutdown(self) {
        // Drop aborts
        info!("Cache background tasks stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.cleanup.is_finished() && self.stats.is_finished()
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.cleanup.abort();
        self.stats.abort();
    }
}
