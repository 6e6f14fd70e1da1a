use serde::{Deserialize, Serialize};

/// The unit of storage in both tiers.
///
/// An entry wraps the cached value together with the bookkeeping the cache
/// needs for expiry and for its promotion/demotion heuristic. All timestamps
/// are milliseconds taken from the cache's [`Clock`](crate::Clock).
///
/// # Fields
///
/// * `key` - Canonical key, unique within a namespace
/// * `value` - The cached value
/// * `created_at` - When the entry was written
/// * `ttl` - Time to live in milliseconds
/// * `expires_at` - `created_at + ttl`
/// * `hit_count` - Successful reads so far; drives demotion on eviction
/// * `last_access` - Time of the last successful read
/// * `size_bytes` - Size of the serialized value, computed at write time
///
/// # Examples
///
/// ```
/// use tiercache_core::CacheEntry;
///
/// let mut entry = CacheEntry::new("answer", 42, 1_000, 60_000, 2);
/// assert_eq!(entry.expires_at, 61_000);
/// assert!(!entry.is_expired(61_000));
/// assert!(entry.is_expired(61_001));
///
/// entry.record_hit(1_500);
/// assert_eq!(entry.hit_count, 1);
/// assert_eq!(entry.last_access, 1_500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub created_at: u64,
    pub ttl: u64,
    pub expires_at: u64,
    pub hit_count: u64,
    pub last_access: u64,
    pub size_bytes: usize,
}

impl<V> CacheEntry<V> {
    /// Creates a fresh entry written at `now_ms`, with zero hits.
    pub fn new(key: impl Into<String>, value: V, now_ms: u64, ttl_ms: u64, size_bytes: usize) -> Self {
        Self {
            key: key.into(),
            value,
            created_at: now_ms,
            ttl: ttl_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
            hit_count: 0,
            last_access: now_ms,
            size_bytes,
        }
    }

    /// Returns true once `now_ms` is past `expires_at`.
    #[inline]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    /// Records a successful read.
    pub fn record_hit(&mut self, now_ms: u64) {
        self.hit_count = self.hit_count.saturating_add(1);
        self.last_access = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_not_expired() {
        let entry = CacheEntry::new("k", 42, 100, 10, 2);
        assert_eq!(entry.value, 42);
        assert_eq!(entry.hit_count, 0);
        assert_eq!(entry.last_access, 100);
        assert!(!entry.is_expired(100));
        assert!(!entry.is_expired(110));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("k", "data", 100, 10, 6);
        assert!(entry.is_expired(111));
        assert!(entry.is_expired(200));
    }

    #[test]
    fn test_ttl_saturates() {
        let entry = CacheEntry::new("k", (), u64::MAX - 1, 10, 0);
        assert_eq!(entry.expires_at, u64::MAX);
    }

    #[test]
    fn test_record_hit() {
        let mut entry = CacheEntry::new("k", 1, 0, 10, 1);
        entry.record_hit(3);
        entry.record_hit(7);
        assert_eq!(entry.hit_count, 2);
        assert_eq!(entry.last_access, 7);
    }

    #[test]
    fn test_serializes_camel_case() {
        let entry = CacheEntry::new("k", 1, 5, 10, 1);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["expiresAt"], 15);
        assert_eq!(json["hitCount"], 0);
        assert_eq!(json["sizeBytes"], 1);
    }
}
