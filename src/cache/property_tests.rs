//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store against simple models of its behavior.

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{AutoTagRules, CacheStore, GlobPattern, ManualClock};

// == Test Configuration ==
const TEST_MAX_MEMORY: u64 = 1024 * 1024;
const TEST_DEFAULT_TTL: u64 = 300;
const CLOCK_START: u64 = 1_000_000;

fn new_store(max_memory: u64) -> (CacheStore, ManualClock) {
    let clock = ManualClock::new(CLOCK_START);
    let store = CacheStore::new(
        max_memory,
        TEST_DEFAULT_TTL,
        AutoTagRules::default(),
        Arc::new(clock.clone()),
    );
    (store, clock)
}

fn json(value: &str) -> String {
    serde_json::to_string(value).unwrap()
}

// == Strategies ==
/// Generates cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,64}".prop_map(|s| s)
}

/// Generates cache values
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}".prop_map(|s| s)
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // A small key space so operations collide
    let key = "[a-e]{1,2}";
    prop_oneof![
        (key, valid_value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, hits, misses and operations match what
    // the individual calls reported, and the store agrees with a plain map.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let (mut store, _) = new_store(TEST_MAX_MEMORY);
        let mut model: HashMap<String, String> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in &ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key.clone(), json(value), None, Vec::new());
                    model.insert(key.clone(), json(value));
                }
                CacheOp::Get { key } => {
                    let got = store.get(key);
                    prop_assert_eq!(&got, &model.get(key).cloned());
                    match got {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(store.delete(key), model.remove(key).is_some());
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.operations, ops.len() as u64, "Operations mismatch");
        prop_assert_eq!(stats.total_keys, model.len(), "Total entries mismatch");
    }

    // Storing then reading before expiry returns the stored value, and the
    // reported TTL never exceeds the one requested.
    #[test]
    fn prop_roundtrip_storage(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl in 1u64..100_000
    ) {
        let (mut store, _) = new_store(TEST_MAX_MEMORY);

        store.set(key.clone(), json(&value), Some(ttl), Vec::new());

        prop_assert_eq!(store.get(&key), Some(json(&value)));
        let remaining = store.ttl(&key);
        prop_assert!(remaining.is_some_and(|r| r <= ttl));
    }

    // After a delete, the key reads as absent and a second delete reports
    // nothing removed.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in valid_value_strategy()) {
        let (mut store, _) = new_store(TEST_MAX_MEMORY);

        store.set(key.clone(), json(&value), None, Vec::new());
        prop_assert!(store.delete(&key));

        prop_assert_eq!(store.get(&key), None);
        prop_assert!(!store.delete(&key));
        prop_assert_eq!(store.memory_usage(), 0);
    }

    // A second write to a key fully replaces the first.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let (mut store, _) = new_store(TEST_MAX_MEMORY);

        store.set(key.clone(), json(&value1), Some(10), vec!["first".to_string()]);
        store.set(key.clone(), json(&value2), None, Vec::new());

        let (value, meta) = store.get_with_meta(&key).unwrap();
        prop_assert_eq!(value, json(&value2));
        prop_assert!(meta.tags.is_empty());
        prop_assert_eq!(meta.ttl, TEST_DEFAULT_TTL);
        prop_assert_eq!(store.len(), 1);
    }

    // An entry is readable until its age passes the TTL and gone after.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in valid_key_strategy(),
        ttl in 1u64..1_000,
        elapsed_ms in 0u64..2_000_000
    ) {
        let (mut store, clock) = new_store(TEST_MAX_MEMORY);

        store.set(key.clone(), "1".to_string(), Some(ttl), Vec::new());
        clock.advance(Duration::from_millis(elapsed_ms));

        let expired = elapsed_ms > ttl * 1000;
        prop_assert_eq!(store.exists(&key), !expired);
        prop_assert_eq!(store.get(&key).is_none(), expired);
        prop_assert_eq!(store.keys(&GlobPattern::any()).is_empty(), expired);
    }

    // For any writes under a ceiling larger than any single entry, estimated
    // usage never ends a write above the ceiling.
    #[test]
    fn prop_memory_ceiling_enforced(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..200
        )
    ) {
        let max_memory = 4 * 1024;
        let (mut store, clock) = new_store(max_memory);

        for (key, value) in entries {
            store.set(key, json(&value), None, Vec::new());
            clock.advance(Duration::from_millis(1));
            prop_assert!(
                store.memory_usage() <= max_memory,
                "Memory usage {} exceeds max {}",
                store.memory_usage(),
                max_memory
            );
        }
    }

    // With equally sized entries and a ceiling of exactly `capacity` of them,
    // one more write evicts exactly the least recently accessed key. Fewer
    // than ten reads keep every access counter a single digit, so sizes stay
    // equal.
    #[test]
    fn prop_eviction_order(
        keys in prop::collection::btree_set("[a-z]{8}", 3..10),
        reads in prop::collection::vec(0usize..100, 0..10),
        new_key in "[A-Z]{8}"
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let value = json("vvvvvvvv");

        // Size of one entry of this shape
        let (mut sample, _) = new_store(TEST_MAX_MEMORY);
        sample.set(keys[0].clone(), value.clone(), None, Vec::new());
        let one = sample.memory_usage();

        let (mut store, clock) = new_store(one * keys.len() as u64);
        let mut order: VecDeque<String> = VecDeque::new();

        for key in &keys {
            store.set(key.clone(), value.clone(), None, Vec::new());
            order.push_back(key.clone());
            clock.advance(Duration::from_millis(1));
        }

        for index in reads {
            let key = &keys[index % keys.len()];
            prop_assert!(store.get(key).is_some());
            order.retain(|k| k != key);
            order.push_back(key.clone());
            clock.advance(Duration::from_millis(1));
        }

        let expected_evicted = order.pop_front().unwrap();
        store.set(new_key.clone(), value.clone(), None, Vec::new());

        prop_assert_eq!(store.len(), keys.len());
        prop_assert_eq!(store.stats().eviction_count, 1);
        prop_assert!(!store.exists(&expected_evicted), "{} should have been evicted", expected_evicted);
        prop_assert!(store.exists(&new_key));
        for key in order {
            prop_assert!(store.exists(&key), "{} should have survived", key);
        }
    }

    // Tag invalidation removes exactly the entries carrying the tag.
    #[test]
    fn prop_delete_by_tags_exact(
        tagged in prop::collection::btree_map(
            "[a-z]{1,6}",
            prop::collection::btree_set(prop::sample::select(vec!["a", "b", "c"]), 0..3),
            1..30
        ),
        target in prop::sample::select(vec!["a", "b", "c"])
    ) {
        let (mut store, _) = new_store(TEST_MAX_MEMORY);
        for (key, tags) in &tagged {
            let tags = tags.iter().map(|t| t.to_string()).collect();
            store.set(key.clone(), "1".to_string(), None, tags);
        }

        let expected: BTreeSet<&String> = tagged
            .iter()
            .filter(|(_, tags)| !tags.contains(target))
            .map(|(key, _)| key)
            .collect();

        let removed = store.delete_by_tags(&[target.to_string()]);
        prop_assert_eq!(removed, tagged.len() - expected.len());

        let remaining = store.keys(&GlobPattern::any());
        prop_assert_eq!(remaining.iter().collect::<BTreeSet<_>>(), expected);
    }

    // Pattern deletes honor anchoring: only keys that start with the literal
    // prefix go.
    #[test]
    fn prop_delete_pattern_exact(keys in prop::collection::btree_set("[ab]{1,3}:[ab]{1,2}", 1..30)) {
        let (mut store, _) = new_store(TEST_MAX_MEMORY);
        for key in &keys {
            store.set(key.clone(), "1".to_string(), None, Vec::new());
        }

        let removed = store.delete_pattern(&GlobPattern::new("a:*").unwrap());
        let expected_removed = keys.iter().filter(|k| k.starts_with("a:")).count();

        prop_assert_eq!(removed, expected_removed);
        prop_assert!(store.keys(&GlobPattern::any()).iter().all(|k| !k.starts_with("a:")));
        prop_assert_eq!(store.len(), keys.len() - expected_removed);
    }
}

// Snapshot round-trips go through the async service facade
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn prop_export_import_roundtrip(
        entries in prop::collection::btree_map(valid_key_strategy(), valid_value_strategy(), 0..30)
    ) {
        use crate::audit::TracingAuditSink;
        use crate::config::CacheConfig;
        use crate::service::CacheService;

        let source = CacheService::with_parts(
            CacheConfig::default(),
            Arc::new(ManualClock::new(CLOCK_START)),
            Arc::new(TracingAuditSink),
        );
        let target = CacheService::with_parts(
            CacheConfig::default(),
            Arc::new(ManualClock::new(CLOCK_START)),
            Arc::new(TracingAuditSink),
        );

        let restored: BTreeMap<String, String> = tokio_test::block_on(async {
            for (key, value) in &entries {
                source.set(key, value, Some(60), &[]).await;
            }

            target.import(source.export().await).await;

            let mut restored = BTreeMap::new();
            for key in target.keys("*").await {
                let value: String = target.get(&key).await.unwrap();
                restored.insert(key, value);
            }
            restored
        });

        prop_assert_eq!(restored, entries);
    }
}
