//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, operations,
//! evictions and time spent per operation.

use std::time::Duration;

use serde::Serialize;

// == Cache Stats ==
/// Raw counters, reset by `flush`.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of public operations served
    pub operations: u64,
    /// Number of entries evicted under memory pressure
    pub evictions: u64,
    /// Time spent inside operations
    pub total_response_time: Duration,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Hit percentage over all lookups, 0.0 if none were made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Operation ==
    /// Counts one operation and the time it took.
    pub fn record_operation(&mut self, elapsed: Duration) {
        self.operations += 1;
        self.total_response_time += elapsed;
    }

    // == Average Response Time ==
    /// Mean time per operation in milliseconds.
    pub fn average_response_time_ms(&self) -> f64 {
        if self.operations == 0 {
            0.0
        } else {
            self.total_response_time.as_secs_f64() * 1000.0 / self.operations as f64
        }
    }

    // == Report ==
    /// Derives the public report.
    ///
    /// # Arguments
    /// * `total_keys` - Entries currently stored
    /// * `used_memory` - Estimated bytes in use
    /// * `uptime_ms` - Time since the cache was constructed
    pub fn report(&self, total_keys: usize, used_memory: u64, uptime_ms: u64) -> StatsReport {
        let hit_rate = round2(self.hit_rate());
        let operations_per_second = if uptime_ms == 0 {
            0.0
        } else {
            round2(self.operations as f64 / (uptime_ms as f64 / 1000.0))
        };

        StatsReport {
            total_keys,
            used_memory,
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            miss_rate: round2(100.0 - hit_rate),
            eviction_count: self.evictions,
            operations: self.operations,
            operations_per_second,
            average_response_time_ms: round2(self.average_response_time_ms()),
        }
    }
}

// == Stats Report ==
/// Point-in-time view of the cache's usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    /// Entries currently stored, expired-but-unswept included
    pub total_keys: usize,
    /// Estimated bytes in use
    pub used_memory: u64,
    pub hits: u64,
    pub misses: u64,
    /// Percentage of lookups that hit, two decimals
    pub hit_rate: f64,
    /// `100 - hit_rate`
    pub miss_rate: f64,
    pub eviction_count: u64,
    pub operations: u64,
    pub operations_per_second: f64,
    pub average_response_time_ms: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
