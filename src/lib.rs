//! tagcache - An in-process key-value cache
//!
//! TTL expiry, tag-based bulk invalidation, glob key matching, approximate
//! memory-bound eviction and usage statistics behind one async facade.
//!
//! ```ignore
//! let cache = CacheService::new(CacheConfig::default());
//! let tasks = cache.start();
//!
//! cache.set("user:1", &user, Some(100), &[]).await;
//! let user: Option<User> = cache.get("user:1").await;
//! cache.del_by_tags(&["user-data"]).await;
//!
//! tasks.shutdown();
//! ```

pub mod audit;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod service;
pub mod snapshot;
pub mod tasks;

pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use cache::{CachePattern, Clock, ManualClock, StatsReport, SystemClock};
pub use config::{CacheConfig, EvictionPolicy};
pub use domain::AppCache;
pub use error::{CacheError, Result};
pub use models::{CacheItem, EntryMeta, ExportMeta, ExportedEntry, ValueWithMeta};
pub use service::CacheService;
pub use tasks::BackgroundTasks;
