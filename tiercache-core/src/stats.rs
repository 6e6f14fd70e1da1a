use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::storage::StorageKind;

/// Counters for one cache instance.
///
/// All operations use atomics with `Relaxed` ordering, so the counters can
/// be bumped through a shared reference from any thread. They start at zero
/// and are only reset by building a new cache.
///
/// # Examples
///
/// ```
/// use tiercache_core::CacheStats;
///
/// let stats = CacheStats::new();
/// stats.record_hit();
/// stats.record_hit();
/// stats.record_miss();
///
/// assert_eq!(stats.hits(), 2);
/// assert_eq!(stats.misses(), 1);
/// assert!((stats.hit_rate() - 0.6666).abs() < 0.001);
/// ```
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
    cleanups: AtomicU64,
    evictions: AtomicU64,
    promotions: AtomicU64,
    demotions: AtomicU64,
}

macro_rules! counter {
    ($record:ident, $get:ident, $field:ident) => {
        #[inline]
        pub fn $record(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }

        #[inline]
        pub fn $get(&self) -> u64 {
            self.$field.load(Ordering::Relaxed)
        }
    };
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    counter!(record_hit, hits, hits);
    counter!(record_miss, misses, misses);
    counter!(record_set, sets, sets);
    counter!(record_delete, deletes, deletes);
    counter!(record_error, errors, errors);
    counter!(record_cleanup, cleanups, cleanups);
    counter!(record_eviction, evictions, evictions);
    counter!(record_promotion, promotions, promotions);
    counter!(record_demotion, demotions, demotions);

    /// Hits plus misses.
    #[inline]
    pub fn total_accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// `hits / (hits + misses)`, or 0.0 before the first read.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Copies the counters into a snapshot, adding the tier figures the
    /// counters don't track.
    pub fn snapshot(
        &self,
        memory_items: usize,
        memory_bytes: usize,
        storage_kind: StorageKind,
    ) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            hit_rate: self.hit_rate(),
            sets: self.sets(),
            deletes: self.deletes(),
            errors: self.errors(),
            cleanups: self.cleanups(),
            evictions: self.evictions(),
            promotions: self.promotions(),
            demotions: self.demotions(),
            memory_items,
            memory_bytes,
            storage_supported: storage_kind != StorageKind::Memory,
            storage_kind,
        }
    }
}

/// Point-in-time view of a cache's statistics.
///
/// Serializes with camelCase keys (`hitRate`, `memoryItems`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
    pub cleanups: u64,
    pub evictions: u64,
    pub promotions: u64,
    pub demotions: u64,
    pub memory_items: usize,
    pub memory_bytes: usize,
    pub storage_supported: bool,
    pub storage_kind: StorageKind,
}
