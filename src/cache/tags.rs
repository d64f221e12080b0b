//! Auto-Tag Rules Module
//!
//! Ordered (pattern → tags) rules applied to every write. Only the first rule
//! whose pattern matches the key contributes tags.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::GlobPattern;

// == Cache Pattern ==
/// Static description of a key family.
///
/// The store itself only applies `tags`. `ttl` is the default used by the
/// family helpers in [`crate::domain`]; `auto_refresh` is descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePattern {
    /// Glob matched against keys
    pub pattern: String,
    /// Human readable purpose
    #[serde(default)]
    pub description: String,
    /// Suggested TTL in seconds for the family
    pub ttl: u64,
    #[serde(default)]
    pub auto_refresh: bool,
    /// Tags attached to every matching key
    pub tags: Vec<String>,
}

impl CachePattern {
    pub fn new(pattern: &str, description: &str, ttl: u64, auto_refresh: bool, tags: &[&str]) -> Self {
        Self {
            pattern: pattern.to_string(),
            description: description.to_string(),
            ttl,
            auto_refresh,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// The rule set every cache starts with unless configured otherwise.
pub fn default_patterns() -> Vec<CachePattern> {
    vec![
        CachePattern::new("user:*", "User data cache", 1800, true, &["user-data"]),
        CachePattern::new("project:*", "Project data cache", 3600, true, &["project-data"]),
        CachePattern::new("task:*", "Task data cache", 900, true, &["task-data"]),
        CachePattern::new("api:*", "API response cache", 300, false, &["api-response"]),
        CachePattern::new("analytics:*", "Analytics data cache", 7200, false, &["analytics"]),
    ]
}

// == Auto Tag Rules ==
/// Compiled rules in definition order.
#[derive(Debug, Clone, Default)]
pub struct AutoTagRules {
    rules: Vec<(GlobPattern, CachePattern)>,
}

impl AutoTagRules {
    // == Constructor ==
    /// Compiles the given patterns, skipping any that do not compile.
    pub fn new(patterns: &[CachePattern]) -> Self {
        let rules = patterns
            .iter()
            .filter_map(|p| match GlobPattern::new(&p.pattern) {
                Ok(glob) => Some((glob, p.clone())),
                Err(e) => {
                    warn!("Skipping auto-tag rule: {}", e);
                    None
                }
            })
            .collect();

        Self { rules }
    }

    // == Rule For ==
    /// The first rule matching `key`, if any.
    pub fn rule_for(&self, key: &str) -> Option<&CachePattern> {
        self.rules
            .iter()
            .find(|(glob, _)| glob.matches(key))
            .map(|(_, pattern)| pattern)
    }

    /// Tags of the first rule matching `key`, if any.
    pub fn tags_for(&self, key: &str) -> Option<&[String]> {
        self.rule_for(key).map(|pattern| pattern.tags.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
