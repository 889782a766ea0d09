//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the memory cache contract over random inputs.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{BinaryData, Cache, MemoryCache};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);
const TEST_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,32}".prop_map(|s| s)
}

/// Generates payloads with a few metadata pairs
fn binary_strategy() -> impl Strategy<Value = BinaryData> {
    (
        prop::collection::vec(any::<u8>(), 0..256),
        prop::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9 ]{0,16}", 0..4),
    )
        .prop_map(|(data, metadata)| BinaryData { data, metadata })
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Invalidate { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), "[a-z]{1,16}").prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
    ]
}

fn new_cache<V: Clone>() -> MemoryCache<V> {
    MemoryCache::new(TEST_TTL, TEST_CLEANUP_INTERVAL)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing then retrieving before expiry returns the same payload and metadata.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in binary_strategy()) {
        let cache = new_cache::<BinaryData>();

        let stored = tokio_test::block_on(cache.set(&key, value.clone())).unwrap();
        let retrieved = tokio_test::block_on(cache.get(&key)).unwrap();

        prop_assert_eq!(&stored, &value);
        prop_assert_eq!(retrieved, Some(value));
    }

    // Keys that were never set are reported missing.
    #[test]
    fn prop_unset_key_is_missing(
        set_keys in prop::collection::hash_set(key_strategy(), 0..10),
        probe in key_strategy()
    ) {
        prop_assume!(!set_keys.contains(&probe));
        let cache = new_cache::<String>();
        for key in &set_keys {
            cache.set_now(key, key.clone());
        }

        prop_assert_eq!(cache.get_now(&probe), None);
    }

    // A second set of the same key wins and leaves a single entry.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        first in binary_strategy(),
        second in binary_strategy()
    ) {
        let cache = new_cache::<BinaryData>();
        cache.set_now(&key, first);
        cache.set_now(&key, second.clone());

        prop_assert_eq!(cache.get_now(&key), Some(second));
        prop_assert_eq!(cache.len(), 1);
    }

    // Any op sequence agrees with a plain map while nothing expires.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache = new_cache::<String>();
        let mut model: HashMap<String, String> = HashMap::new();
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set_now(&key, value.clone());
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got = cache.get_now(&key);
                    if got.is_some() { expected_hits += 1 } else { expected_misses += 1 }
                    prop_assert_eq!(got.as_ref(), model.get(&key));
                }
                CacheOp::Invalidate { key } => {
                    cache.invalidate_now(&key);
                    model.remove(&key);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(cache.len(), model.len());
    }
}
