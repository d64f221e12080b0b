//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{default_patterns, memory::parse_memory_limit, CachePattern, DEFAULT_MAX_MEMORY};

// == Eviction Policy ==
/// Requested eviction policy.
///
/// Accepted for compatibility with Redis-style configuration. The cache always
/// evicts oldest-accessed entries first, whatever is chosen here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionPolicy {
    #[default]
    AllkeysLru,
    VolatileLru,
    AllkeysLfu,
    VolatileLfu,
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allkeys-lru" => Ok(Self::AllkeysLru),
            "volatile-lru" => Ok(Self::VolatileLru),
            "allkeys-lfu" => Ok(Self::AllkeysLfu),
            "volatile-lfu" => Ok(Self::VolatileLfu),
            other => Err(format!("unknown eviction policy '{}'", other)),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AllkeysLru => "allkeys-lru",
            Self::VolatileLru => "volatile-lru",
            Self::AllkeysLfu => "allkeys-lfu",
            Self::VolatileLfu => "volatile-lfu",
        };
        f.write_str(label)
    }
}

// == Cache Config ==
/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults, or deserialized from any serde format (missing fields default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL in seconds for writes without an explicit TTL
    pub default_ttl: u64,
    /// Memory ceiling such as `"256mb"`
    pub max_memory: String,
    /// Informational only
    pub eviction_policy: EvictionPolicy,
    /// Informational only; use export/import for snapshots
    pub persistence_enabled: bool,
    /// Informational only
    pub cluster_mode: bool,
    /// Expired-entry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Statistics logging interval in seconds
    pub stats_interval: u64,
    /// Snapshot file restored at startup and written at shutdown by the binary
    pub snapshot_path: Option<String>,
    /// Auto-tag rules, first match wins
    pub patterns: Vec<CachePattern>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `MAX_MEMORY` - Memory ceiling (default: 256mb)
    /// - `EVICTION_POLICY` - allkeys-lru, volatile-lru, allkeys-lfu, volatile-lfu
    /// - `PERSISTENCE_ENABLED` - true/false (default: true)
    /// - `CLUSTER_MODE` - true/false (default: false)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 300)
    /// - `STATS_INTERVAL` - Stats logging frequency in seconds (default: 60)
    /// - `SNAPSHOT_PATH` - Snapshot file used by the binary (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: env_parse("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            max_memory: env::var("MAX_MEMORY").unwrap_or(defaults.max_memory),
            eviction_policy: env_parse("EVICTION_POLICY").unwrap_or(defaults.eviction_policy),
            persistence_enabled: env_parse("PERSISTENCE_ENABLED")
                .unwrap_or(defaults.persistence_enabled),
            cluster_mode: env_parse("CLUSTER_MODE").unwrap_or(defaults.cluster_mode),
            cleanup_interval: env_parse("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            stats_interval: env_parse("STATS_INTERVAL").unwrap_or(defaults.stats_interval),
            snapshot_path: env::var("SNAPSHOT_PATH").ok().filter(|p| !p.is_empty()),
            patterns: defaults.patterns,
        }
    }

    // == Max Memory Bytes ==
    /// The memory ceiling in bytes, 256 MiB when `max_memory` does not parse.
    pub fn max_memory_bytes(&self) -> u64 {
        match parse_memory_limit(&self.max_memory) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("{}, using {} bytes", e, DEFAULT_MAX_MEMORY);
                DEFAULT_MAX_MEMORY
            }
        }
    }

    pub fn cleanup_period(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }

    pub fn stats_period(&self) -> Duration {
        Duration::from_secs(self.stats_interval.max(1))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: 3600,
            max_memory: "256mb".to_string(),
            eviction_policy: EvictionPolicy::default(),
            persistence_enabled: true,
            cluster_mode: false,
            cleanup_interval: 300,
            stats_interval: 60,
            snapshot_path: None,
            patterns: default_patterns(),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
