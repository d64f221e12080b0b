//! Cache Store Module
//!
//! Main cache engine: HashMap storage with lazy TTL expiry, auto-tagging,
//! memory-bound eviction and statistics. Values are JSON text at this level;
//! typing happens in the service facade.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::memory::select_victims;
use crate::cache::{AutoTagRules, CacheEntry, CacheStats, Clock, GlobPattern, StatsReport};
use crate::config::CacheConfig;
use crate::models::{EntryMeta, ExportMeta, ExportedEntry};

// == Cache Store ==
/// Main cache storage with TTL expiry and oldest-accessed eviction.
///
/// Every method takes `&mut self`: reads update access bookkeeping and may
/// drop expired entries, so callers share the store behind one mutex.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Auto-tag rules applied on every write
    tag_rules: AutoTagRules,
    clock: Arc<dyn Clock>,
    /// Memory ceiling in bytes
    max_memory: u64,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
    /// Sum of entry size estimates
    used_memory: u64,
    /// Last touch sequence handed out
    access_seq: u64,
    /// Construction time, for operations per second
    started_at: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `max_memory` - Memory ceiling in bytes
    /// * `default_ttl` - Default TTL in seconds for entries without explicit TTL
    /// * `tag_rules` - Auto-tag rules
    /// * `clock` - Time source for entry timestamps
    pub fn new(max_memory: u64, default_ttl: u64, tag_rules: AutoTagRules, clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now_ms();
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            tag_rules,
            clock,
            max_memory,
            default_ttl,
            used_memory: 0,
            access_seq: 0,
            started_at,
        }
    }

    /// Creates a store from configuration.
    pub fn from_config(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config.max_memory_bytes(),
            config.default_ttl,
            AutoTagRules::new(&config.patterns),
            clock,
        )
    }

    // == Set ==
    /// Stores a JSON-encoded value.
    ///
    /// An existing entry under the same key is replaced outright. Room is
    /// made by evicting oldest-accessed entries before the insert.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - JSON-encoded value
    /// * `ttl` - TTL in seconds; `None` or zero uses the default
    /// * `tags` - Caller tags, merged with the first matching auto-tag rule
    pub fn set(&mut self, key: String, value: String, ttl: Option<u64>, tags: Vec<String>) {
        self.timed(|store| store.insert(key, value, ttl, tags));
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<String> {
        self.timed(|store| store.lookup(key).map(|entry| entry.value.clone()))
    }

    // == Get With Meta ==
    /// Like [`get`](Self::get), also returning the entry metadata.
    pub fn get_with_meta(&mut self, key: &str) -> Option<(String, EntryMeta)> {
        self.timed(|store| store.lookup(key).map(|entry| (entry.value.clone(), entry.meta())))
    }

    // == Exists ==
    /// True for a live entry. Does not count as a hit or miss.
    pub fn exists(&mut self, key: &str) -> bool {
        self.timed(|store| store.live(key).is_some())
    }

    // == Delete ==
    /// Removes an entry, reporting whether a live one existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.timed(|store| {
            let now = store.clock.now_ms();
            match store.remove_entry(key) {
                Some(entry) if !entry.is_expired(now) => {
                    debug!("Cache DELETE: {}", key);
                    true
                }
                _ => false,
            }
        })
    }

    // == Delete Pattern ==
    /// Removes every key matching `pattern`. Returns how many were live.
    pub fn delete_pattern(&mut self, pattern: &GlobPattern) -> usize {
        self.timed(|store| {
            let removed = store.remove_where(|entry| pattern.matches(&entry.key));
            info!("Cache DELETE pattern: {} ({} keys removed)", pattern.as_str(), removed);
            removed
        })
    }

    // == Delete By Tags ==
    /// Removes every entry carrying at least one of `tags`. Returns how many
    /// were live.
    pub fn delete_by_tags(&mut self, tags: &[String]) -> usize {
        self.timed(|store| {
            let removed = store.remove_where(|entry| tags.iter().any(|t| entry.tags.contains(t)));
            info!("Cache DELETE by tags: [{}] ({} keys removed)", tags.join(", "), removed);
            removed
        })
    }

    // == Expire ==
    /// Gives a live entry a new TTL starting now.
    pub fn expire(&mut self, key: &str, ttl: u64) -> bool {
        self.timed(|store| {
            let now = store.clock.now_ms();
            let Some(entry) = store.live(key) else {
                return false;
            };

            let old_size = entry.size;
            entry.reset_ttl(ttl, now);
            let new_size = entry.size;
            store.used_memory = store.used_memory - old_size + new_size;
            true
        })
    }

    // == TTL ==
    /// Remaining lifetime in whole seconds, rounded up.
    ///
    /// `None` when the key is absent or its time is up; an entry found with
    /// no time left is removed.
    pub fn ttl(&mut self, key: &str) -> Option<u64> {
        self.timed(|store| {
            let now = store.clock.now_ms();
            let remaining = store.entries.get(key)?.ttl_remaining(now);
            if remaining.is_none() {
                store.remove_entry(key);
            }
            remaining
        })
    }

    // == Keys ==
    /// Sorted live keys matching `pattern`. Expired matches are dropped.
    pub fn keys(&mut self, pattern: &GlobPattern) -> Vec<String> {
        self.timed(|store| {
            store.purge_expired();
            let mut keys: Vec<String> = store
                .entries
                .keys()
                .filter(|key| pattern.matches(key))
                .cloned()
                .collect();
            keys.sort();
            keys
        })
    }

    // == Increment ==
    /// Adds `delta` to the integer stored at `key` and writes it back.
    ///
    /// Absent or non-integer values count as 0. The write is a full `set`:
    /// the TTL returns to the default and caller tags are dropped.
    pub fn increment(&mut self, key: &str, delta: i64) -> i64 {
        self.timed(|store| {
            let current = store
                .lookup(key)
                .and_then(|entry| serde_json::from_str::<i64>(&entry.value).ok())
                .unwrap_or(0);
            let next = current.saturating_add(delta);
            store.insert(key.to_string(), next.to_string(), None, Vec::new());
            next
        })
    }

    // == Clear ==
    /// Drops every entry and resets statistics. Returns how many entries
    /// were stored.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.used_memory = 0;
        self.stats = CacheStats::new();
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.purge_expired()
    }

    // == Export ==
    /// Live entries with their values decoded, sorted by key.
    pub fn export(&self) -> Vec<ExportedEntry> {
        let now = self.clock.now_ms();
        let mut exported: Vec<ExportedEntry> = self
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| ExportedEntry {
                key: entry.key.clone(),
                value: serde_json::from_str(&entry.value)
                    .unwrap_or_else(|_| Value::String(entry.value.clone())),
                meta: ExportMeta {
                    ttl: entry.ttl,
                    created_at: entry.created_at,
                    tags: entry.tags.iter().cloned().collect(),
                },
            })
            .collect();
        exported.sort_by(|a, b| a.key.cmp(&b.key));
        exported
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> StatsReport {
        let uptime = self.clock.now_ms().saturating_sub(self.started_at);
        self.stats.report(self.entries.len(), self.used_memory, uptime)
    }

    /// Estimated bytes used by all entries.
    pub fn memory_usage(&self) -> u64 {
        self.used_memory
    }

    pub fn max_memory(&self) -> u64 {
        self.max_memory
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Internals ==

    fn timed<R>(&mut self, op: impl FnOnce(&mut Self) -> R) -> R {
        let started = Instant::now();
        let result = op(self);
        self.stats.record_operation(started.elapsed());
        result
    }

    fn next_seq(&mut self) -> u64 {
        self.access_seq += 1;
        self.access_seq
    }

    fn insert(&mut self, key: String, value: String, ttl: Option<u64>, tags: Vec<String>) {
        let ttl = ttl.filter(|t| *t > 0).unwrap_or(self.default_ttl);
        let mut tags: BTreeSet<String> = tags.into_iter().collect();
        if let Some(auto) = self.tag_rules.tags_for(&key) {
            tags.extend(auto.iter().cloned());
        }

        let now = self.clock.now_ms();
        let seq = self.next_seq();
        let entry = CacheEntry::new(key, value, ttl, tags, now, seq);

        self.make_room(&entry);
        debug!(
            "Cache SET: {} (TTL: {}s, Tags: [{}])",
            entry.key,
            ttl,
            entry.tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        );

        self.used_memory += entry.size;
        if let Some(old) = self.entries.insert(entry.key.clone(), entry) {
            self.used_memory -= old.size;
        }
    }

    /// Evicts oldest-accessed entries until `incoming` fits under the ceiling.
    fn make_room(&mut self, incoming: &CacheEntry) {
        let replaced = self.entries.get(&incoming.key).map_or(0, |e| e.size);
        let projected = self.used_memory - replaced + incoming.size;
        if projected <= self.max_memory {
            return;
        }

        let excess = projected - self.max_memory;
        let victims = select_victims(
            self.entries.values().filter(|e| e.key != incoming.key),
            excess,
        );

        let mut freed = 0;
        for key in &victims {
            if let Some(entry) = self.remove_entry(key) {
                freed += entry.size;
                self.stats.record_eviction();
            }
        }

        info!(
            "Cache eviction: {} bytes freed, {} entries removed",
            freed,
            victims.len()
        );
    }

    /// Live entry lookup that records a hit or miss and touches on hit.
    fn lookup(&mut self, key: &str) -> Option<&mut CacheEntry> {
        let now = self.clock.now_ms();
        let seq = self.next_seq();

        let Some(entry) = self.live(key) else {
            self.stats.record_miss();
            return None;
        };

        let old_size = entry.size;
        entry.touch(now, seq);
        let (access_count, new_size) = (entry.access_count, entry.size);
        self.used_memory = self.used_memory - old_size + new_size;
        self.stats.record_hit();
        debug!("Cache HIT: {} (Access count: {})", key, access_count);

        self.entries.get_mut(key)
    }

    /// Live entry lookup with lazy expiry and no bookkeeping.
    fn live(&mut self, key: &str) -> Option<&mut CacheEntry> {
        let now = self.clock.now_ms();
        if self.entries.get(key)?.is_expired(now) {
            self.remove_entry(key);
            return None;
        }
        self.entries.get_mut(key)
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.used_memory -= entry.size;
        Some(entry)
    }

    /// Removes entries selected by `predicate` and counts the live ones.
    fn remove_where(&mut self, predicate: impl Fn(&CacheEntry) -> bool) -> usize {
        let now = self.clock.now_ms();
        let doomed: Vec<String> = self
            .entries
            .values()
            .filter(|entry| predicate(entry))
            .map(|entry| entry.key.clone())
            .collect();

        doomed
            .iter()
            .filter_map(|key| self.remove_entry(key))
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        let mut freed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                freed += entry.size;
            }
            keep
        });
        self.used_memory -= freed;
        before - self.entries.len()
    }
}
