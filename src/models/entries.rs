//! Entry views returned by the cache
//!
//! Metadata for `get_with_meta` and the export/import snapshot format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entry bookkeeping without the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMeta {
    pub key: String,
    /// Lifetime in seconds
    pub ttl: u64,
    /// Unix milliseconds
    pub created_at: u64,
    /// Unix milliseconds of the last read
    pub accessed_at: u64,
    pub access_count: u64,
    pub tags: Vec<String>,
}

/// A decoded value together with its entry metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueWithMeta<T> {
    pub value: T,
    pub meta: EntryMeta,
}

/// Metadata carried through export/import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMeta {
    pub ttl: u64,
    pub created_at: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One live entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub key: String,
    pub value: Value,
    pub meta: ExportMeta,
}
