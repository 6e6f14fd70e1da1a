use serde::Serialize;

use crate::codec::ItemCodec;
use crate::config::CacheConfig;
use crate::error::PersistError;
use crate::storage::PersistentStore;
use crate::CacheEntry;

/// Entries evicted with more hits than this are demoted to storage.
pub const DEMOTION_MIN_HITS: u64 = 2;

/// Decides what moves between the memory tier and the persistent tier.
///
/// - **Eviction**: the memory tier always evicts its least recently used entry.
/// - **Demotion**: an evicted entry with `hit_count > 2` is copied to storage
///   (best-effort); colder entries are simply dropped.
/// - **Write-through**: `set` writes to storage immediately when asked to,
///   when the entry is larger than `persist_threshold_bytes`, or when its TTL
///   is longer than the default TTL.
/// - **Promotion**: a storage hit is copied back into memory unchanged; it
///   keeps its `hit_count` and `expires_at`.
///
/// # Examples
///
/// ```
/// use tiercache_core::{CacheConfig, CacheEntry, PromotionPolicy};
///
/// let policy = PromotionPolicy::from_config(&CacheConfig::default());
///
/// let mut entry = CacheEntry::new("k", 1, 0, 1_000, 1);
/// assert!(!policy.should_demote(&entry));
/// for t in 0..3 {
///     entry.record_hit(t);
/// }
/// assert!(policy.should_demote(&entry));
///
/// let long_lived = CacheEntry::new("k", 1, 0, 7_200_000, 1);
/// assert!(policy.should_persist(&long_lived, false));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionPolicy {
    pub persist_threshold_bytes: usize,
    pub default_ttl_ms: u64,
}

impl PromotionPolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            persist_threshold_bytes: config.persist_threshold_bytes,
            default_ttl_ms: config.default_ttl_ms,
        }
    }

    /// Whether an entry evicted from memory is hot enough to keep in storage.
    #[inline]
    pub fn should_demote<V>(&self, entry: &CacheEntry<V>) -> bool {
        entry.hit_count > DEMOTION_MIN_HITS
    }

    /// Whether `set` should write the entry to storage right away.
    pub fn should_persist<V>(&self, entry: &CacheEntry<V>, requested: bool) -> bool {
        requested
            || entry.size_bytes > self.persist_threshold_bytes
            || entry.ttl > self.default_ttl_ms
    }
}

/// Encodes `entry` and writes it to `store` under its own key.
pub(crate) fn persist_entry<V: Serialize>(
    store: &PersistentStore,
    codec: &ItemCodec,
    entry: &CacheEntry<V>,
) -> Result<(), PersistError> {
    let bytes = codec.encode(entry)?;
    store.put(&entry.key, &bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StoreError;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn policy() -> PromotionPolicy {
        PromotionPolicy {
            persist_threshold_bytes: 100,
            default_ttl_ms: 1_000,
        }
    }

    fn entry_with_hits(hits: u64) -> CacheEntry<i32> {
        let mut entry = CacheEntry::new("k", 1, 0, 1_000, 1);
        entry.hit_count = hits;
        entry
    }

    #[test]
    fn test_demotion_threshold() {
        let p = policy();
        assert!(!p.should_demote(&entry_with_hits(0)));
        assert!(!p.should_demote(&entry_with_hits(2)));
        assert!(p.should_demote(&entry_with_hits(3)));
    }

    #[test]
    fn test_should_persist_rules() {
        let p = policy();
        let small = CacheEntry::new("k", 1, 0, 1_000, 100);
        assert!(!p.should_persist(&small, false));
        assert!(p.should_persist(&small, true));

        let big = CacheEntry::new("k", 1, 0, 1_000, 101);
        assert!(p.should_persist(&big, false));

        let long_lived = CacheEntry::new("k", 1, 0, 1_001, 1);
        assert!(p.should_persist(&long_lived, false));
    }

    #[test]
    fn test_persist_entry_writes_decodable_record() {
        let clock = Arc::new(ManualClock::new(0));
        let codec = ItemCodec::default();
        let store = PersistentStore::new("ns", Arc::new(MemoryStore::default()), codec, clock);
        let entry = CacheEntry::new("k", "payload".to_string(), 0, 1_000, 9);

        persist_entry(&store, &codec, &entry).unwrap();
        let bytes = store.get("k").unwrap();
        assert_eq!(codec.decode::<String>(&bytes).unwrap(), entry);
    }

    #[test]
    fn test_persist_entry_reports_quota() {
        let clock = Arc::new(ManualClock::new(0));
        let codec = ItemCodec::default();
        let store = PersistentStore::new("ns", Arc::new(MemoryStore::new(8)), codec, clock);
        let entry = CacheEntry::new("k", 1, 0, 1_000, 1);

        let err = persist_entry(&store, &codec, &entry).unwrap_err();
        assert!(matches!(
            err,
            PersistError::Store(StoreError::QuotaExceeded { .. })
        ));
    }
}
