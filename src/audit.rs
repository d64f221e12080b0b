//! Audit Module
//!
//! Structured events handed to an external audit collaborator. The cache
//! emits exactly one: a record of every `flush`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::Result;

// == Audit Event ==
/// A single audited action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Component that performed the action
    pub source: String,
    pub category: String,
    pub action: String,
    pub outcome: String,
    pub severity: String,
    pub description: String,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// The event recorded after a flush removed `keys_removed` entries.
    pub fn cache_flush(keys_removed: usize) -> Self {
        Self {
            source: "cache".to_string(),
            category: "system_config".to_string(),
            action: "cache_flush".to_string(),
            outcome: "success".to_string(),
            severity: "medium".to_string(),
            description: "Cache flushed completely".to_string(),
            metadata: json!({ "keysRemoved": keys_removed }),
            timestamp: Utc::now(),
        }
    }
}

// == Audit Sink ==
/// Receiver of audit events.
///
/// Errors are logged by the caller and never retried.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<()>;
}

// == Tracing Audit Sink ==
/// Writes events to the `audit` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        let payload = serde_json::to_string(&event)?;
        info!(target: "audit", "{}", payload);
        Ok(())
    }
}
