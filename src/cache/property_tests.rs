//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify correctness properties of the partitioned store.

use proptest::prelude::*;

use serde_json::json;

use crate::cache::{CacheStore, Partition};
use crate::config::Config;

const P: Partition = Partition::SearchResults;

fn test_store(max_entries: usize) -> CacheStore {
    let config = Config {
        search_max_entries: max_entries,
        ..Config::default()
    };
    CacheStore::in_memory(&config)
}

// == Strategies ==
/// Generates cache keys shaped like normalized queries
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9 ]{1,24}"
}

/// Generates string payloads
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn partition_stats(store: &CacheStore, partition: Partition) -> crate::cache::PartitionStats {
    store
        .stats()
        .into_iter()
        .find(|(p, _)| *p == partition)
        .map(|(_, stats)| stats)
        .expect("partition stats present")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of cache operations, hit/miss counters reflect
    // exactly the Get outcomes that occurred.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = test_store(100);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(P, &key, json!(value), None);
                }
                CacheOp::Get { key } => {
                    if store.get(P, &key).is_some() {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                    }
                }
                CacheOp::Delete { key } => {
                    store.delete(P, &key);
                }
            }
        }

        let stats = partition_stats(&store, P);
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(P), "Total entries mismatch");
    }

    // For any key-value pair, storing then retrieving it before expiration
    // returns the same value.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut store = test_store(100);

        store.set(P, &key, json!(value.clone()), None);
        let entry = store.get(P, &key).expect("entry present before TTL");
        prop_assert_eq!(entry.value, json!(value), "Round-trip value mismatch");
    }

    // For any key that exists, after delete a subsequent get is absent.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut store = test_store(100);

        store.set(P, &key, json!(value), None);
        prop_assert!(store.get(P, &key).is_some(), "Key should exist before delete");

        store.delete(P, &key);
        prop_assert!(store.get(P, &key).is_none(), "Key should not exist after delete");
    }

    // Storing V1 then V2 under the same key yields V2 and a single entry.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let mut store = test_store(100);

        store.set(P, &key, json!(value1), None);
        store.set(P, &key, json!(value2.clone()), None);

        let entry = store.get(P, &key).expect("entry present");
        prop_assert_eq!(entry.value, json!(value2), "Overwrite should return new value");
        prop_assert_eq!(store.len(P), 1, "Should have exactly one entry after overwrite");
    }

    // For any sequence of sets, the partition never exceeds its capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..100
        )
    ) {
        let max_entries = 20;
        let mut store = test_store(max_entries);

        for (key, value) in entries {
            store.set(P, &key, json!(value), None);
            prop_assert!(
                store.len(P) <= max_entries,
                "Partition size {} exceeds max {}",
                store.len(P),
                max_entries
            );
        }
    }

    // Inserting into a full partition evicts exactly the entry that the
    // documented order (ascending last_accessed_at, then key) selects.
    #[test]
    fn prop_eviction_follows_documented_order(
        keys in prop::collection::hash_set("[a-z]{1,12}", 2..8),
        new_key in "[0-9]{1,8}",
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let capacity = keys.len();
        let mut store = test_store(capacity);

        for key in &keys {
            store.set(P, key, json!("v"), None);
        }
        prop_assert_eq!(store.len(P), capacity);

        // get_all clones entries without touching access metadata, so this
        // snapshot predicts the victim
        let mut order: Vec<(u64, String)> = store
            .get_all(P)
            .into_iter()
            .map(|(key, entry)| (entry.last_accessed_at, key))
            .collect();
        order.sort();
        let expected_victim = order[0].1.clone();

        store.set(P, &new_key, json!("new"), None);

        prop_assert_eq!(store.len(P), capacity, "Partition must stay at capacity");
        prop_assert!(
            store.get(P, &expected_victim).is_none(),
            "Victim '{}' should have been evicted",
            expected_victim
        );
        prop_assert!(store.get(P, &new_key).is_some(), "New key should exist");
        for (_, key) in &order[1..] {
            prop_assert!(store.get(P, key).is_some(), "Key '{}' should survive", key);
        }
    }
}
