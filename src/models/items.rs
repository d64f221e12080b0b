//! Batch write items
//!
//! Input shape shared by `mset` and `warmup`.

use serde::{Deserialize, Serialize};

/// One value to store, with its optional TTL and tags.
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl`: Optional TTL in seconds (uses default if not specified)
/// - `tags`: Extra invalidation tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheItem<T> {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: T,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl<T> CacheItem<T> {
    /// Creates an item using the default TTL and no explicit tags.
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
            ttl: None,
            tags: Vec::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}
