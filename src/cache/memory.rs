//! Memory Accounting Module
//!
//! Memory ceiling parsing and victim selection for eviction under memory
//! pressure.

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

// == Constants ==
/// Ceiling used when the configured limit cannot be parsed (256 MiB)
pub const DEFAULT_MAX_MEMORY: u64 = 256 * 1024 * 1024;

const UNITS: [(&str, u64); 3] = [("kb", 1024), ("mb", 1024 * 1024), ("gb", 1024 * 1024 * 1024)];

// == Parse Memory Limit ==
/// Parses limits such as `"10kb"`, `"256mb"` or `"1GB"` into bytes.
pub fn parse_memory_limit(limit: &str) -> Result<u64> {
    let lower = limit.to_ascii_lowercase();
    let invalid = || CacheError::InvalidMemoryLimit(limit.to_string());

    let (digits, multiplier) = UNITS
        .iter()
        .find_map(|(suffix, multiplier)| lower.strip_suffix(suffix).map(|d| (d, *multiplier)))
        .ok_or_else(invalid)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}

// == Select Victims ==
/// Picks the oldest-accessed entries whose sizes add up to `bytes_to_free`.
///
/// Entries are ordered by `accessed_at`, ties broken by touch sequence. Stops
/// as soon as enough bytes are covered.
pub fn select_victims<'a, I>(candidates: I, bytes_to_free: u64) -> Vec<String>
where
    I: IntoIterator<Item = &'a CacheEntry>,
{
    let mut ordered: Vec<&CacheEntry> = candidates.into_iter().collect();
    ordered.sort_by_key(|e| (e.accessed_at, e.access_seq));

    let mut freed = 0;
    let mut victims = Vec::new();
    for entry in ordered {
        if freed >= bytes_to_free {
            break;
        }
        freed += entry.size;
        victims.push(entry.key.clone());
    }

    victims
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn entry(key: &str, accessed_at: u64, seq: u64, size: u64) -> CacheEntry {
        let mut e = CacheEntry::new(key.to_string(), "1".to_string(), 60, BTreeSet::new(), 0, seq);
        e.accessed_at = accessed_at;
        e.size = size;
        e
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_memory_limit("10kb").unwrap(), 10 * 1024);
        assert_eq!(parse_memory_limit("256mb").unwrap(), 256 * 1024 * 1024);
        assert_eq!(parse_memory_limit("512MB").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_memory_limit("2gb").unwrap(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "mb", "256", "256 mb", "-1mb", "1.5gb", "ten mb", "256tb"] {
            assert!(
                matches!(parse_memory_limit(bad), Err(CacheError::InvalidMemoryLimit(_))),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_overflow_is_invalid() {
        assert!(parse_memory_limit("99999999999999999999gb").is_err());
        assert!(parse_memory_limit("18446744073709551615gb").is_err());
    }

    #[test]
    fn test_select_oldest_first() {
        let entries = [entry("c", 300, 3, 10), entry("a", 100, 1, 10), entry("b", 200, 2, 10)];

        assert_eq!(select_victims(&entries, 15), vec!["a", "b"]);
        assert_eq!(select_victims(&entries, 10), vec!["a"]);
    }

    #[test]
    fn test_select_ties_use_sequence() {
        let entries = [entry("late", 100, 9, 10), entry("early", 100, 4, 10)];
        assert_eq!(select_victims(&entries, 1), vec!["early"]);
    }

    #[test]
    fn test_select_nothing_to_free() {
        let entries = [entry("a", 100, 1, 10)];
        assert!(select_victims(&entries, 0).is_empty());
    }

    #[test]
    fn test_select_everything_when_short() {
        let entries = [entry("a", 100, 1, 10), entry("b", 200, 2, 10)];
        assert_eq!(select_victims(&entries, 1_000), vec!["a", "b"]);
    }
}
