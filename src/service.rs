//! Cache Service
//!
//! The public face of the cache: typed values in and out, batch helpers,
//! cache-aside, TTL management and bulk snapshotting on top of a single
//! mutex-guarded [`CacheStore`].
//!
//! # Lifecycle
//! Construct one service per process and clone it into collaborators. Call
//! [`CacheService::start`] inside a tokio runtime to run the expiry sweep and
//! statistics logging, and keep the returned guard alive until shutdown.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::audit::{AuditEvent, AuditSink, TracingAuditSink};
use crate::cache::{CacheStore, Clock, GlobPattern, StatsReport, SystemClock};
use crate::config::CacheConfig;
use crate::models::{CacheItem, ExportedEntry, ValueWithMeta};
use crate::tasks::BackgroundTasks;

// == Cache Service ==
/// Thread-safe cache handle. Cloning shares the same store.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<Mutex<CacheStore>>,
    audit: Arc<dyn AuditSink>,
    config: Arc<CacheConfig>,
}

impl fmt::Debug for CacheService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CacheService {
    // == Constructors ==
    /// Creates a service on the system clock, auditing to tracing.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(TracingAuditSink))
    }

    /// Creates a service with an explicit clock and audit sink.
    pub fn with_parts(config: CacheConfig, clock: Arc<dyn Clock>, audit: Arc<dyn AuditSink>) -> Self {
        let store = CacheStore::from_config(&config, clock);
        info!(
            "Cache service initialized: default_ttl={}s, max_memory={} ({} bytes), eviction_policy={}, auto-tag rules={}",
            config.default_ttl,
            config.max_memory,
            store.max_memory(),
            config.eviction_policy,
            config.patterns.len()
        );
        if config.cluster_mode {
            warn!("cluster_mode is set but this cache is single-process only");
        }

        Self {
            store: Arc::new(Mutex::new(store)),
            audit,
            config: Arc::new(config),
        }
    }

    // == Start ==
    /// Spawns the expiry sweep and statistics logging tasks.
    ///
    /// Both stop when the returned guard is shut down or dropped.
    pub fn start(&self) -> BackgroundTasks {
        BackgroundTasks::spawn(
            self.store.clone(),
            self.config.cleanup_period(),
            self.config.stats_period(),
        )
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Set ==
    /// Stores a value.
    ///
    /// Never fails: a value that cannot be encoded as JSON is stored as its
    /// `Debug` rendering instead.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - TTL in seconds; `None` uses the configured default
    /// * `tags` - Invalidation tags in addition to auto-tags
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<u64>, tags: &[&str])
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        let tags = tags.iter().map(|t| t.to_string()).collect();
        self.set_encoded(key.to_string(), encode(key, value), ttl, tags).await;
    }

    // == Get ==
    /// Fetches and decodes a value.
    ///
    /// `None` when the key is missing or expired, or when the stored value
    /// does not decode as `T`. A value that fails to decode was still found,
    /// so it counts as a hit and is touched.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).await?;
        decode(key, &raw)
    }

    /// Fetches the stored JSON text, for callers with their own decoder.
    pub async fn get_raw(&self, key: &str) -> Option<String> {
        self.store.lock().await.get(key)
    }

    // == Get With Meta ==
    /// Like [`get`](Self::get), with the entry metadata. A decode failure
    /// still counts as a hit.
    pub async fn get_with_meta<T: DeserializeOwned>(&self, key: &str) -> Option<ValueWithMeta<T>> {
        let (raw, meta) = self.store.lock().await.get_with_meta(key)?;
        let value = decode(key, &raw)?;
        Some(ValueWithMeta { value, meta })
    }

    // == Delete ==
    pub async fn del(&self, key: &str) -> bool {
        self.store.lock().await.delete(key)
    }

    /// Removes every key matching a glob. An invalid glob removes nothing.
    pub async fn del_pattern(&self, pattern: &str) -> usize {
        let Some(glob) = compile(pattern) else {
            return 0;
        };
        self.store.lock().await.delete_pattern(&glob)
    }

    /// Removes every entry carrying any of `tags`.
    pub async fn del_by_tags(&self, tags: &[&str]) -> usize {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        self.store.lock().await.delete_by_tags(&tags)
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.store.lock().await.exists(key)
    }

    // == Batch ==
    /// Gets each key independently.
    pub async fn mget<T: DeserializeOwned>(&self, keys: &[&str]) -> Vec<Option<T>> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            results.push(self.get(key).await);
        }
        results
    }

    /// Sets each item independently; there is no cross-key atomicity.
    pub async fn mset<T: Serialize + fmt::Debug>(&self, items: &[CacheItem<T>]) {
        for item in items {
            self.set_item(item).await;
        }
    }

    // == Get Or Set ==
    /// Cache-aside: returns the cached value or stores what `factory` makes.
    ///
    /// The lock is not held while `factory` runs. Concurrent misses on the
    /// same key each call their own factory and the last write wins.
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, factory: F, ttl: Option<u64>, tags: &[&str]) -> T
    where
        T: Serialize + DeserializeOwned + fmt::Debug,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(cached) = self.get(key).await {
            return cached;
        }

        let value = factory().await;
        self.set(key, &value, ttl, tags).await;
        value
    }

    /// Like [`get_or_set`](Self::get_or_set) with a fallible factory.
    ///
    /// A factory error is returned as-is and nothing is cached.
    pub async fn try_get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        factory: F,
        ttl: Option<u64>,
        tags: &[&str],
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned + fmt::Debug,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(cached) = self.get(key).await {
            return Ok(cached);
        }

        let value = factory().await?;
        self.set(key, &value, ttl, tags).await;
        Ok(value)
    }

    // == Counters ==
    /// Adds `delta` to an integer value, starting from 0.
    ///
    /// Rewrites the entry, so the TTL returns to the default each time.
    pub async fn increment(&self, key: &str, delta: i64) -> i64 {
        self.store.lock().await.increment(key, delta)
    }

    pub async fn decrement(&self, key: &str, delta: i64) -> i64 {
        self.increment(key, delta.saturating_neg()).await
    }

    // == TTL Management ==
    /// Gives a live key a fresh TTL. False if the key is absent.
    pub async fn expire(&self, key: &str, ttl: u64) -> bool {
        self.store.lock().await.expire(key, ttl)
    }

    /// Seconds left for a key, `None` if absent or expired.
    pub async fn ttl(&self, key: &str) -> Option<u64> {
        self.store.lock().await.ttl(key)
    }

    // == Keys ==
    /// Sorted live keys matching a glob (`"*"` for all).
    pub async fn keys(&self, pattern: &str) -> Vec<String> {
        let Some(glob) = compile(pattern) else {
            return Vec::new();
        };
        self.store.lock().await.keys(&glob)
    }

    // == Flush ==
    /// Removes everything, resets statistics and records an audit event.
    ///
    /// Returns the number of keys removed. An audit failure is logged and
    /// does not undo the flush.
    pub async fn flush(&self) -> usize {
        let removed = self.store.lock().await.clear();
        info!("Cache FLUSH: {} keys removed", removed);

        if let Err(e) = self.audit.record(AuditEvent::cache_flush(removed)).await {
            warn!("Failed to record cache flush audit event: {}", e);
        }
        removed
    }

    // == Stats ==
    pub async fn stats(&self) -> StatsReport {
        self.store.lock().await.stats()
    }

    // == Warmup / Export / Import ==
    /// Pre-populates the cache.
    pub async fn warmup<T: Serialize + fmt::Debug>(&self, items: &[CacheItem<T>]) {
        info!("Cache warmup started for {} entries", items.len());
        for item in items {
            self.set_item(item).await;
        }
        info!("Cache warmup completed");
    }

    /// Live entries with decoded values, sorted by key.
    pub async fn export(&self) -> Vec<ExportedEntry> {
        self.store.lock().await.export()
    }

    /// Re-inserts exported entries. TTLs restart from now.
    pub async fn import(&self, entries: Vec<ExportedEntry>) -> usize {
        info!("Cache import started for {} entries", entries.len());
        let count = entries.len();
        for entry in entries {
            let raw = encode(&entry.key, &entry.value);
            self.set_encoded(entry.key, raw, Some(entry.meta.ttl), entry.meta.tags)
                .await;
        }
        info!("Cache import completed");
        count
    }

    // == Internals ==

    async fn set_item<T: Serialize + fmt::Debug>(&self, item: &CacheItem<T>) {
        let raw = encode(&item.key, &item.value);
        self.set_encoded(item.key.clone(), raw, item.ttl, item.tags.clone())
            .await;
    }

    async fn set_encoded(&self, key: String, raw: String, ttl: Option<u64>, tags: Vec<String>) {
        self.store.lock().await.set(key, raw, ttl, tags);
    }
}

/// JSON-encodes a value, falling back to its `Debug` text as a JSON string.
fn encode<T: Serialize + fmt::Debug + ?Sized>(key: &str, value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        warn!("Cache serialization failed for {}: {}", key, e);
        Value::String(format!("{:?}", value)).to_string()
    })
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    serde_json::from_str(raw)
        .map_err(|e| warn!("Cached value for {} does not decode: {}", key, e))
        .ok()
}

fn compile(pattern: &str) -> Option<GlobPattern> {
    GlobPattern::new(pattern)
        .map_err(|e| warn!("{}", e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug)]
    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to serialize"))
        }
    }

    #[test]
    fn test_encode_json() {
        assert_eq!(encode("k", &vec![1, 2]), "[1,2]");
        assert_eq!(encode("k", "text"), "\"text\"");
    }

    #[test]
    fn test_encode_degrades_to_debug_string() {
        assert_eq!(encode("k", &Unencodable), "\"Unencodable\"");

        // Non-string map keys cannot be JSON object keys
        let mut map = HashMap::new();
        map.insert(vec![1u8], 2u8);
        let raw = encode("k", &map);
        assert_eq!(serde_json::from_str::<String>(&raw).unwrap(), "{[1]: 2}");
    }

    #[test]
    fn test_decode_mismatch_is_none() {
        assert_eq!(decode::<u32>("k", "\"text\""), None);
        assert_eq!(decode::<u32>("k", "7"), Some(7));
    }

    #[test]
    fn test_compile_any() {
        assert!(compile("*").unwrap().matches("x"));
    }
}
