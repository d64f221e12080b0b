//! Pattern Matcher Module
//!
//! Translates the limited glob syntax accepted by `keys`, `del_pattern` and
//! auto-tag rules into an anchored regular expression.
//!
//! - `*` matches any run of characters (including none)
//! - `?` matches exactly one character
//! - everything else matches itself

use regex::Regex;

use crate::error::{CacheError, Result};

// == Glob Pattern ==
/// A compiled, fully anchored glob.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    // == Constructor ==
    /// Compiles a glob.
    pub fn new(glob: &str) -> Result<Self> {
        let regex = Regex::new(&glob_to_regex(glob)).map_err(|e| CacheError::InvalidPattern {
            pattern: glob.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: glob.to_string(),
            regex,
        })
    }

    /// Pattern matching every key.
    pub fn any() -> Self {
        Self {
            source: "*".to_string(),
            regex: Regex::new("^.*$").expect("static pattern compiles"),
        }
    }

    // == Matches ==
    /// Tests a key against the whole pattern.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// The glob this pattern was built from.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

// == Translation ==
/// Builds the anchored regex source for a glob.
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');

    let mut literal = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }

    out.push('$');
    out
}
