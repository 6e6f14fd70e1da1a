//! End-to-end tests for the tiered cache facade
//!
//! Every cache here is bound to its own in-memory backend and a manual
//! clock, so the tests run in parallel and never sleep.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tiercache::{
    CacheBuilder, CacheConfig, ManualClock, MemoryStore, Regex, SetOptions, StorageBackend,
    TieredCache,
};

fn build<V>(config: CacheConfig) -> (TieredCache<V>, Arc<ManualClock>, Arc<MemoryStore>)
where
    V: Clone + Serialize + for<'de> Deserialize<'de>,
{
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let backend = Arc::new(MemoryStore::default());
    let cache = CacheBuilder::new()
        .config(config)
        .backend(backend.clone())
        .clock(clock.clone())
        .build();
    (cache, clock, backend)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
    roles: Vec<String>,
}

/// Values handed out by `get` are copies, never views into the cache
#[test]
fn test_get_returns_deep_copy() {
    let (cache, _, _) = build::<User>(CacheConfig::default());
    cache.set(
        "u1",
        User {
            id: 1,
            name: "ada".into(),
            roles: vec!["admin".into()],
        },
    );

    let first = cache.get("u1").unwrap();
    let second = cache.get("u1").unwrap();
    assert_eq!(first, second);
    assert_ne!(first.roles.as_ptr(), second.roles.as_ptr());

    let mut edited = first;
    edited.roles.clear();
    assert_eq!(cache.get("u1").unwrap().roles, vec!["admin".to_string()]);
}

#[test]
fn test_ttl_expiry_counts_a_miss() {
    let (cache, clock, _) = build::<Value>(CacheConfig::default());
    cache.set_with("a", json!({"x": 1}), SetOptions::new().ttl(Duration::from_millis(10)));

    clock.advance(Duration::from_millis(20));
    let misses_before = cache.stats().misses;
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.stats().misses, misses_before + 1);
    assert!(!cache.has("a"));
}

/// 51 keys into the default capacity of 50 pushes out the first one
#[test]
fn test_capacity_evicts_least_recently_used() {
    let (cache, _, backend) = build::<u32>(CacheConfig::default());
    assert_eq!(cache.config().max_memory_size, 50);

    // Every entry is read once after insert, so hit counts are equal and
    // only recency decides which key the 51st insert evicts
    for i in 1..=51u32 {
        cache.set(&i, i);
        assert_eq!(cache.get(&i), Some(i));
    }
    assert_eq!(cache.len(), 50);
    assert_eq!(cache.stats().evictions, 1);
    assert_eq!(cache.stats().demotions, 0);

    assert_eq!(cache.get(&1u32), None);
    for i in 2..=51u32 {
        assert_eq!(cache.get(&i), Some(i));
    }
    assert!(!cache.has(&1u32));
    assert!(backend.keys().unwrap().is_empty());
}

#[test]
fn test_hot_entry_survives_eviction() {
    let (cache, _, backend) =
        build::<String>(CacheConfig::default().with_namespace("hot").with_max_memory_size(2));

    cache.set("popular", "p".to_string());
    for _ in 0..3 {
        cache.get("popular");
    }
    cache.set("b", "b".to_string());
    cache.set("c", "c".to_string());

    let stats = cache.stats();
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.demotions, 1);
    assert_eq!(backend.keys().unwrap(), vec!["hot:popular".to_string()]);
    assert!(!cache.keys().contains(&"popular".to_string()));

    // Read from storage and brought back into memory
    assert_eq!(cache.get("popular"), Some("p".to_string()));
    assert_eq!(cache.stats().promotions, 1);
    assert_eq!(cache.keys()[0], "popular");
}

#[test]
fn test_promoted_entry_keeps_its_expiry() {
    let (cache, clock, _) = build::<String>(CacheConfig::default().with_max_memory_size(1));
    cache.set_with(
        "p",
        "v".to_string(),
        SetOptions::new().ttl(Duration::from_millis(100)).persistent(),
    );
    cache.set("other", "o".to_string());

    clock.advance(Duration::from_millis(60));
    assert_eq!(cache.get("p"), Some("v".to_string()));

    clock.advance(Duration::from_millis(60));
    assert_eq!(cache.get("p"), None);
}

#[test]
fn test_clear_leaves_other_namespaces_alone() {
    let backend = Arc::new(MemoryStore::default());
    let users: TieredCache<String> = CacheBuilder::new()
        .config(CacheConfig::default().with_namespace("users"))
        .backend(backend.clone())
        .build();
    let orders: TieredCache<String> = CacheBuilder::new()
        .config(CacheConfig::default().with_namespace("orders"))
        .backend(backend.clone())
        .build();

    let persist = SetOptions::new().persistent();
    users.set_with("1", "alice".to_string(), persist);
    users.set_with("2", "bob".to_string(), persist);
    orders.set_with("1", "book".to_string(), persist);
    backend.put("unrelated", b"raw").unwrap();

    assert_eq!(users.clear(None), 2);
    assert!(!users.has("1"));
    assert_eq!(orders.get("1"), Some("book".to_string()));

    let mut keys = backend.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["orders:1".to_string(), "unrelated".to_string()]);
}

#[test]
fn test_clear_with_pattern_matches_canonical_keys() {
    let (cache, _, _) = build::<u32>(CacheConfig::default());
    cache.set("session:a", 1);
    cache.set("session:b", 2);
    cache.set("profile", 3);

    // ':' is normalized to '_' before the pattern sees the key
    assert_eq!(cache.clear(Some(&Regex::new("^session:").unwrap())), 0);
    assert_eq!(cache.clear(Some(&Regex::new("^session_").unwrap())), 2);
    assert_eq!(cache.keys(), vec!["profile".to_string()]);
}

#[test]
fn test_preload_from_map() {
    let (cache, _, _) = build::<String>(CacheConfig::default());
    let seed: std::collections::HashMap<String, String> = (0..5)
        .map(|i| (format!("k{i}"), format!("v{i}")))
        .collect();

    assert_eq!(cache.preload(seed), 5);
    assert_eq!(cache.get("k3"), Some("v3".to_string()));
    assert_eq!(cache.stats().sets, 5);
}

#[test]
fn test_stats_hit_rate() {
    let (cache, _, _) = build::<u32>(CacheConfig::default());
    assert_eq!(cache.stats().hit_rate, 0.0);

    cache.set("a", 1);
    cache.get("a");
    cache.get("a");
    cache.get("a");
    cache.get("missing");

    let stats = cache.stats();
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate - 0.75).abs() < f64::EPSILON);
    assert_eq!(stats.memory_items, 1);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["hitRate"], 0.75);
    assert_eq!(json["storageKind"], "memory");
}

/// A full store is swept of expired records and the write retried
#[test]
fn test_quota_recovery_after_sweep() {
    let clock = Arc::new(ManualClock::new(0));
    let backend = Arc::new(MemoryStore::new(2_000));
    let cache: TieredCache<String> = CacheBuilder::new()
        .config(CacheConfig::default().with_compression(false))
        .backend(backend.clone())
        .clock(clock.clone())
        .build();

    let payload = "x".repeat(1_000);
    cache.set_with(
        "old",
        payload.clone(),
        SetOptions::new().ttl(Duration::from_millis(5)).persistent(),
    );
    clock.advance(Duration::from_millis(10));

    assert!(cache.set_with("new", payload, SetOptions::new().persistent()));
    assert_eq!(cache.stats().errors, 0);
    assert_eq!(backend.keys().unwrap(), vec!["tiercache:new".to_string()]);
}

#[test]
fn test_quota_exhausted_keeps_value_in_memory() {
    let backend = Arc::new(MemoryStore::new(2_000));
    let cache: TieredCache<String> = CacheBuilder::new()
        .config(CacheConfig::default().with_compression(false))
        .backend(backend.clone())
        .build();

    let payload = "y".repeat(1_000);
    cache.set_with("first", payload.clone(), SetOptions::new().persistent());
    assert!(cache.set_with("second", payload.clone(), SetOptions::new().persistent()));

    assert_eq!(cache.stats().errors, 1);
    assert_eq!(cache.get("second"), Some(payload));
    assert_eq!(backend.keys().unwrap(), vec!["tiercache:first".to_string()]);
}

#[test]
fn test_cleanup_sweeps_both_tiers() {
    let (cache, clock, backend) = build::<String>(CacheConfig::default());
    let short = SetOptions::new().ttl(Duration::from_millis(50));

    cache.set_with("m1", "a".to_string(), short);
    cache.set_with("m2", "b".to_string(), short);
    cache.set_with("p1", "c".to_string(), short.persistent());
    cache.set("keep", "d".to_string());
    backend.put("tiercache:garbage", b"{broken").unwrap();

    clock.advance(Duration::from_millis(51));
    assert_eq!(cache.cleanup(), 4);
    assert_eq!(cache.keys(), vec!["keep".to_string()]);
    assert!(backend.keys().unwrap().is_empty());
    assert_eq!(cache.stats().cleanups, 1);
}

#[test]
fn test_config_from_json() {
    let config = CacheConfig::from_json(
        r#"{"maxMemorySize": 2, "defaultTTL": 1000, "namespace": "json", "compression": false}"#,
    )
    .unwrap();
    let (cache, clock, _) = build::<u32>(config);

    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);
    assert_eq!(cache.len(), 2);

    clock.advance(Duration::from_millis(1_001));
    assert_eq!(cache.get("c"), None);
}

#[test]
fn test_shared_across_threads() {
    let (cache, _, _) = build::<u64>(CacheConfig::default().with_max_memory_size(1_000));
    let cache = Arc::new(cache);

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..100u64 {
                    let key = format!("{t}-{i}");
                    cache.set(&key, i);
                    assert_eq!(cache.get(&key), Some(i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = cache.stats();
    assert_eq!(cache.len(), 400);
    assert_eq!(stats.sets, 400);
    assert_eq!(stats.hits, 400);
}
