//! Data shapes exchanged with cache callers
//!
//! Batch inputs, entry metadata and the export/import snapshot format.

pub mod entries;
pub mod items;

// Re-export commonly used types
pub use entries::{EntryMeta, ExportMeta, ExportedEntry, ValueWithMeta};
pub use items::CacheItem;
