//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between cleanup runs. It holds the store lock only while sweeping.
///
/// # Arguments
/// * `cache` - Shared reference to the cache store
/// * `interval` - Time between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
pub fn spawn_cleanup_task(cache: Arc<Mutex<CacheStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Cache cleanup scheduler started ({:?} interval)", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.lock().await.cleanup_expired();

            if removed > 0 {
                info!("Cache cleanup: {} expired entries removed", removed);
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AutoTagRules, ManualClock};

    fn shared_store(clock: &ManualClock) -> Arc<Mutex<CacheStore>> {
        Arc::new(Mutex::new(CacheStore::new(
            1024 * 1024,
            300,
            AutoTagRules::default(),
            Arc::new(clock.clone()),
        )))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let clock = ManualClock::new(0);
        let cache = shared_store(&clock);

        cache
            .lock()
            .await
            .set("expire_soon".to_string(), "1".to_string(), Some(1), Vec::new());
        clock.advance(Duration::from_secs(2));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(150)).await;

        // Swept without any read touching it
        assert_eq!(cache.lock().await.len(), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let clock = ManualClock::new(0);
        let cache = shared_store(&clock);

        cache
            .lock()
            .await
            .set("long_lived".to_string(), "1".to_string(), Some(3600), Vec::new());

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.lock().await.get("long_lived").as_deref(), Some("1"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let clock = ManualClock::new(0);
        let handle = spawn_cleanup_task(shared_store(&clock), Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
