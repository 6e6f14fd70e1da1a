use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{duration_to_ms, Clock};
use crate::codec::ItemCodec;
use crate::config::CacheConfig;
use crate::keys::{canonical_key, CacheableKey};
use crate::memory_tier::MemoryTier;
use crate::promotion::{persist_entry, PromotionPolicy};
use crate::stats::{CacheStats, StatsSnapshot};
use crate::storage::{PersistentStore, StorageKind};
use crate::sweep::SweepGuard;
use crate::{CacheBuilder, CacheEntry};

/// Per-call options for [`TieredCache::set_with`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tiercache_core::SetOptions;
///
/// let opts = SetOptions::new().ttl(Duration::from_secs(30)).persistent();
/// assert_eq!(opts.ttl, Some(Duration::from_secs(30)));
/// assert!(opts.persistent);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// TTL for this entry; the configured default when `None`.
    pub ttl: Option<Duration>,
    /// Write to the persistent tier right away.
    pub persistent: bool,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }
}

/// One item handed to [`TieredCache::preload`].
pub struct PreloadItem<K, V> {
    pub key: K,
    pub value: V,
    pub options: SetOptions,
}

/// Conversion into a [`PreloadItem`].
///
/// Implemented for `(key, value)` pairs, so maps and vectors of pairs can be
/// preloaded directly, and for `(key, value, SetOptions)` triples.
pub trait IntoPreloadItem<V> {
    type Key: CacheableKey;

    fn into_preload_item(self) -> PreloadItem<Self::Key, V>;
}

impl<K: CacheableKey, V> IntoPreloadItem<V> for (K, V) {
    type Key = K;

    fn into_preload_item(self) -> PreloadItem<K, V> {
        PreloadItem {
            key: self.0,
            value: self.1,
            options: SetOptions::default(),
        }
    }
}

impl<K: CacheableKey, V> IntoPreloadItem<V> for (K, V, SetOptions) {
    type Key = K;

    fn into_preload_item(self) -> PreloadItem<K, V> {
        PreloadItem {
            key: self.0,
            value: self.1,
            options: self.2,
        }
    }
}

impl<K: CacheableKey, V> IntoPreloadItem<V> for PreloadItem<K, V> {
    type Key = K;

    fn into_preload_item(self) -> PreloadItem<K, V> {
        self
    }
}

/// A two-tier cache: an LRU memory tier in front of a persistent byte store.
///
/// # Behavior
///
/// - **get**: memory first; on a memory miss the persistent tier is checked
///   and a hit is promoted back into memory. Expired entries are removed
///   from both tiers and read as a miss.
/// - **set**: the entry goes into memory, evicting the least recently used
///   entry if full (entries with more than two hits are demoted to storage
///   rather than dropped). Large, long-lived or explicitly persistent
///   entries are also written to storage immediately.
/// - **cleanup**: one active sweep over both tiers, removing expired and
///   corrupt entries. Concurrent sweep requests are skipped.
///
/// No operation returns an error or panics: internal failures turn into
/// `false`, `0` or `None` and bump the `errors` counter.
///
/// The cache is `Send + Sync`; wrap it in an `Arc` to share it with a
/// timer-driven sweeper.
///
/// # Examples
///
/// ```
/// use tiercache_core::{CacheBuilder, CacheConfig, MemoryStore, TieredCache};
/// use std::sync::Arc;
///
/// let cache: TieredCache<Vec<u32>> = CacheBuilder::new()
///     .config(CacheConfig::default().with_namespace("docs"))
///     .backend(Arc::new(MemoryStore::default()))
///     .build();
///
/// assert!(cache.set("primes", vec![2, 3, 5]));
/// assert_eq!(cache.get("primes"), Some(vec![2, 3, 5]));
/// assert!(cache.delete("primes"));
/// assert!(!cache.has("primes"));
/// ```
pub struct TieredCache<V> {
    config: CacheConfig,
    memory: Mutex<MemoryTier<V>>,
    store: PersistentStore,
    codec: ItemCodec,
    policy: PromotionPolicy,
    stats: CacheStats,
    clock: Arc<dyn Clock>,
    sweeping: AtomicBool,
}

impl<V> TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    /// Creates a cache for `config`, choosing storage by probe-and-fallback.
    pub fn new(config: CacheConfig) -> Self {
        CacheBuilder::new().config(config).build()
    }

    pub(crate) fn from_parts(config: CacheConfig, store: PersistentStore, clock: Arc<dyn Clock>) -> Self {
        info!(
            namespace = %config.namespace,
            capacity = config.max_memory_size,
            storage = %store.kind(),
            "tiered cache ready"
        );
        Self {
            memory: Mutex::new(MemoryTier::new(config.max_memory_size)),
            codec: ItemCodec::new(config.compression),
            policy: PromotionPolicy::from_config(&config),
            stats: CacheStats::new(),
            sweeping: AtomicBool::new(false),
            config,
            store,
            clock,
        }
    }

    /// Stores `value` under `key` with default options.
    pub fn set<K: CacheableKey + ?Sized>(&self, key: &K, value: V) -> bool {
        self.set_with(key, value, SetOptions::default())
    }

    /// Stores `value` under `key`.
    ///
    /// Returns `false` only when the value cannot be serialized. A failed
    /// write to the persistent tier is logged and counted, but the value is
    /// still cached in memory.
    pub fn set_with<K: CacheableKey + ?Sized>(&self, key: &K, value: V, options: SetOptions) -> bool {
        let key = canonical_key(key);

        let size_bytes = match serde_json::to_vec(&value) {
            Ok(bytes) => bytes.len(),
            Err(e) => {
                warn!(key = %key, error = %e, "value is not serializable, not cached");
                self.stats.record_error();
                return false;
            }
        };

        let ttl_ms = options
            .ttl
            .map(duration_to_ms)
            .unwrap_or(self.config.default_ttl_ms);
        let now = self.clock.now_ms();
        let entry = CacheEntry::new(key.clone(), value, now, ttl_ms, size_bytes);
        let persist = self.policy.should_persist(&entry, options.persistent);

        let record = if persist {
            match self.codec.encode(&entry) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(key = %key, error = %e, "failed to encode entry for storage");
                    self.stats.record_error();
                    None
                }
            }
        } else {
            None
        };

        {
            let mut memory = self.memory.lock();
            self.insert_memory(&mut memory, key.clone(), entry, now);
        }

        if let Some(bytes) = record {
            if let Err(e) = self.store.put(&key, &bytes) {
                warn!(key = %key, error = %e, "failed to persist entry, kept in memory only");
                self.stats.record_error();
            }
        } else if !persist {
            // An older persisted copy must not resurface after eviction
            self.store.remove(&key);
        }

        self.stats.record_set();
        true
    }

    /// Returns a copy of the value for `key`, if present and not expired.
    pub fn get<K: CacheableKey + ?Sized>(&self, key: &K) -> Option<V> {
        let key = canonical_key(key);
        let now = self.clock.now_ms();
        let mut memory = self.memory.lock();

        match memory.get(&key).map(|entry| entry.is_expired(now)) {
            Some(true) => {
                memory.remove(&key);
                self.store.remove(&key);
                debug!(key = %key, "expired on read");
                self.stats.record_miss();
                return None;
            }
            Some(false) => {
                memory.touch(&key);
                if let Some(entry) = memory.get_mut(&key) {
                    entry.record_hit(now);
                    self.stats.record_hit();
                    return Some(entry.value.clone());
                }
            }
            None => {}
        }

        let Some(mut entry) = self.load_persisted(&key, now) else {
            self.stats.record_miss();
            return None;
        };

        entry.record_hit(now);
        let value = entry.value.clone();
        self.insert_memory(&mut memory, key.clone(), entry, now);
        debug!(key = %key, "promoted from storage");
        self.stats.record_promotion();
        self.stats.record_hit();
        Some(value)
    }

    /// Whether `key` holds a live value in either tier.
    ///
    /// Leaves LRU order and hit counters alone; an expired entry found on
    /// the way is removed.
    pub fn has<K: CacheableKey + ?Sized>(&self, key: &K) -> bool {
        let key = canonical_key(key);
        let now = self.clock.now_ms();
        let mut memory = self.memory.lock();

        if let Some(entry) = memory.get(&key) {
            if !entry.is_expired(now) {
                return true;
            }
            memory.remove(&key);
            self.store.remove(&key);
            return false;
        }

        self.load_persisted(&key, now).is_some()
    }

    /// Removes `key` from both tiers; true if either held it.
    pub fn delete<K: CacheableKey + ?Sized>(&self, key: &K) -> bool {
        let key = canonical_key(key);
        let in_memory = self.memory.lock().remove(&key).is_some();
        let in_store = self.store.remove(&key);

        let removed = in_memory || in_store;
        if removed {
            self.stats.record_delete();
        }
        removed
    }

    /// Clears the cache, or only the memory keys matching `pattern`.
    ///
    /// Without a pattern, the memory tier is flushed and every persistent
    /// key in this namespace is removed; keys of other namespaces sharing
    /// the store are left alone. With a pattern, each canonical key in the
    /// memory tier that matches is deleted from both tiers.
    ///
    /// Returns the number of distinct keys removed.
    pub fn clear(&self, pattern: Option<&Regex>) -> usize {
        match pattern {
            None => {
                let mut removed: HashSet<String> = {
                    let mut memory = self.memory.lock();
                    let keys = memory.keys();
                    memory.clear();
                    keys.into_iter().collect()
                };
                for key in self.store.keys() {
                    if self.store.remove(&key) {
                        removed.insert(key);
                    }
                }
                info!(namespace = %self.config.namespace, removed = removed.len(), "cache cleared");
                removed.len()
            }
            Some(pattern) => {
                let matching: Vec<String> = self
                    .memory
                    .lock()
                    .keys()
                    .into_iter()
                    .filter(|key| pattern.is_match(key))
                    .collect();
                matching.iter().filter(|key| self.delete(key.as_str())).count()
            }
        }
    }

    /// Runs one active sweep over both tiers.
    ///
    /// Removes memory entries past `expires_at`, then persisted records that
    /// are expired or fail to decode. Returns the number of distinct keys
    /// removed, or 0 without doing anything when a sweep is already running.
    pub fn cleanup(&self) -> usize {
        let Some(_guard) = SweepGuard::acquire(&self.sweeping) else {
            debug!(namespace = %self.config.namespace, "sweep already in flight, skipped");
            return 0;
        };

        let now = self.clock.now_ms();
        let mut removed: HashSet<String> = {
            let mut memory = self.memory.lock();
            let expired = memory.expired_keys(now);
            for key in &expired {
                memory.remove(key);
            }
            expired.into_iter().collect()
        };
        removed.extend(self.store.sweep_expired_keys());

        let stored = self.store.keys().len();
        if stored > self.config.max_storage_size {
            warn!(
                namespace = %self.config.namespace,
                stored,
                limit = self.config.max_storage_size,
                "persistent tier holds more entries than maxStorageSize"
            );
        }

        self.stats.record_cleanup();
        debug!(namespace = %self.config.namespace, removed = removed.len(), "sweep finished");
        removed.len()
    }

    /// Sets every item; returns how many were stored.
    ///
    /// Accepts anything iterable over `(key, value)` pairs or
    /// `(key, value, SetOptions)` triples.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use std::sync::Arc;
    /// use tiercache_core::{CacheBuilder, MemoryStore, SetOptions, TieredCache};
    ///
    /// let cache: TieredCache<i32> = CacheBuilder::new().backend(Arc::new(MemoryStore::default())).build();
    ///
    /// let map = HashMap::from([("a", 1), ("b", 2)]);
    /// assert_eq!(cache.preload(map), 2);
    ///
    /// assert_eq!(cache.preload(vec![("c", 3, SetOptions::new().persistent())]), 1);
    /// assert_eq!(cache.get("c"), Some(3));
    /// ```
    pub fn preload<I>(&self, items: I) -> usize
    where
        I: IntoIterator,
        I::Item: IntoPreloadItem<V>,
    {
        let mut loaded = 0;
        for item in items.into_iter().map(IntoPreloadItem::into_preload_item) {
            if self.set_with(&item.key, item.value, item.options) {
                loaded += 1;
            }
        }
        debug!(namespace = %self.config.namespace, loaded, "preload finished");
        loaded
    }

    /// Current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        let memory = self.memory.lock();
        self.stats
            .snapshot(memory.len(), memory.total_bytes(), self.store.kind())
    }

    /// Number of entries in the memory tier.
    pub fn len(&self) -> usize {
        self.memory.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.lock().is_empty()
    }

    /// Canonical keys in the memory tier, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.memory.lock().lru_order()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.store.kind()
    }

    /// Inserts into memory, demoting the evicted entry when it is hot enough.
    fn insert_memory(&self, memory: &mut MemoryTier<V>, key: String, entry: CacheEntry<V>, now: u64) {
        let Some((evicted_key, evicted)) = memory.insert(key, entry) else {
            return;
        };
        self.stats.record_eviction();

        if !self.policy.should_demote(&evicted) || evicted.is_expired(now) {
            debug!(key = %evicted_key, hits = evicted.hit_count, "evicted");
            return;
        }

        match persist_entry(&self.store, &self.codec, &evicted) {
            Ok(()) => {
                self.stats.record_demotion();
                debug!(key = %evicted_key, hits = evicted.hit_count, "evicted and demoted to storage");
            }
            Err(e) => {
                self.stats.record_error();
                warn!(key = %evicted_key, error = %e, "demotion failed, entry dropped");
            }
        }
    }

    /// Reads a live entry from the persistent tier.
    ///
    /// Expired and undecodable records are removed and read as absent.
    fn load_persisted(&self, key: &str, now: u64) -> Option<CacheEntry<V>> {
        let bytes = self.store.get(key)?;
        match self.codec.decode::<V>(&bytes) {
            Ok(entry) if entry.is_expired(now) => {
                self.store.remove(key);
                debug!(key, "persisted entry expired on read");
                None
            }
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable persisted entry");
                self.store.remove(key);
                None
            }
        }
    }
}
