//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::EntryMeta;

// == Cache Entry ==
/// A single cache entry: the serialized value plus its bookkeeping.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Key the entry is stored under
    pub key: String,
    /// JSON-encoded value
    pub value: String,
    /// Lifetime in seconds, counted from `created_at`
    pub ttl: u64,
    /// Creation (or last `expire`) timestamp, Unix milliseconds
    pub created_at: u64,
    /// Last successful read, Unix milliseconds
    pub accessed_at: u64,
    /// Number of successful reads
    pub access_count: u64,
    /// Invalidation tags
    pub tags: BTreeSet<String>,
    /// Touch order, breaks `accessed_at` ties during eviction
    #[serde(skip)]
    pub access_seq: u64,
    /// Estimated footprint in bytes, refreshed on write, read and expire
    #[serde(skip)]
    pub size: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry and estimates its size.
    ///
    /// # Arguments
    /// * `key` - Key to store the entry under
    /// * `value` - JSON-encoded value
    /// * `ttl` - Lifetime in seconds
    /// * `tags` - Invalidation tags, already merged with auto-tags
    /// * `now_ms` - Creation timestamp
    /// * `access_seq` - Current touch sequence
    pub fn new(
        key: String,
        value: String,
        ttl: u64,
        tags: BTreeSet<String>,
        now_ms: u64,
        access_seq: u64,
    ) -> Self {
        let mut entry = Self {
            key,
            value,
            ttl,
            created_at: now_ms,
            accessed_at: now_ms,
            access_count: 0,
            tags,
            access_seq,
            size: 0,
        };
        entry.size = entry.estimate_size();
        entry
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its TTL.
    ///
    /// Strictly greater: an entry whose age equals its TTL is still live.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at) > self.ttl.saturating_mul(1000)
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds, or `None` once nothing is left.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        let elapsed = now_ms.saturating_sub(self.created_at);
        let remaining = self.ttl.saturating_mul(1000).saturating_sub(elapsed);
        (remaining > 0).then_some(remaining)
    }

    /// Remaining lifetime in whole seconds, rounded up.
    pub fn ttl_remaining(&self, now_ms: u64) -> Option<u64> {
        self.ttl_remaining_ms(now_ms).map(|ms| ms.div_ceil(1000))
    }

    // == Touch ==
    /// Records a successful read and re-estimates the size, which grows with
    /// the access counter.
    pub fn touch(&mut self, now_ms: u64, access_seq: u64) {
        self.accessed_at = now_ms;
        self.access_count += 1;
        self.access_seq = access_seq;
        self.size = self.estimate_size();
    }

    // == Reset TTL ==
    /// Replaces the TTL and restarts the age clock.
    pub fn reset_ttl(&mut self, ttl: u64, now_ms: u64) {
        self.ttl = ttl;
        self.created_at = now_ms;
        self.size = self.estimate_size();
    }

    // == Size Estimate ==
    /// Value length plus the length of the entry's JSON form.
    pub fn estimate_size(&self) -> u64 {
        let metadata = serde_json::to_string(self).map_or(0, |json| json.len());
        (self.value.len() + metadata) as u64
    }

    /// Returns everything but the value.
    pub fn meta(&self) -> EntryMeta {
        EntryMeta {
            key: self.key.clone(),
            ttl: self.ttl,
            created_at: self.created_at,
            accessed_at: self.accessed_at,
            access_count: self.access_count,
            tags: self.tags.iter().cloned().collect(),
        }
    }
}
