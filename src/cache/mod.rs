//! Cache Module
//!
//! In-memory caching with TTL expiry, tag invalidation, glob matching and
//! memory-bound eviction.

mod clock;
mod entry;
pub mod memory;
mod pattern;
mod stats;
mod store;
mod tags;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use memory::{parse_memory_limit, DEFAULT_MAX_MEMORY};
pub use pattern::GlobPattern;
pub use stats::{CacheStats, StatsReport};
pub use store::CacheStore;
pub use tags::{default_patterns, AutoTagRules, CachePattern};
