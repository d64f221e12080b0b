//! Error types for the cache
//!
//! Cache operations never surface these to callers: every failure degrades to
//! a safe default inside the facade. They exist for the fallible helpers
//! underneath (limit parsing, glob compilation, snapshot files, audit sinks).

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache internals.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Memory limit string is not `<digits><kb|mb|gb>`
    #[error("Invalid memory limit: {0}")]
    InvalidMemoryLimit(String),

    /// Glob pattern could not be compiled into a matcher
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Value or snapshot could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Audit collaborator rejected an event
    #[error("Audit sink error: {0}")]
    Audit(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
