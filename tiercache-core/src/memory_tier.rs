use std::collections::{HashMap, VecDeque};

use crate::utils::{move_key_to_end, remove_key};
use crate::CacheEntry;

/// The hot tier: a bounded map of entries plus their LRU order.
///
/// The order queue holds every key in the map exactly once; its front is the
/// least recently used key (the next eviction victim) and its back the most
/// recently used. Capacity is a number of entries, at least one.
///
/// `get` never touches the order: the cache first checks expiry, then calls
/// [`touch`](MemoryTier::touch) on a real hit.
///
/// # Examples
///
/// ```
/// use tiercache_core::{CacheEntry, MemoryTier};
///
/// let mut tier = MemoryTier::new(2);
/// tier.insert("a".into(), CacheEntry::new("a", 1, 0, 100, 1));
/// tier.insert("b".into(), CacheEntry::new("b", 2, 0, 100, 1));
/// tier.touch("a");
///
/// // "b" is now least recently used
/// let evicted = tier.insert("c".into(), CacheEntry::new("c", 3, 0, 100, 1));
/// assert_eq!(evicted.map(|(k, _)| k), Some("b".to_string()));
/// assert_eq!(tier.lru_order(), vec!["c", "a"]);
/// ```
#[derive(Debug)]
pub struct MemoryTier<V> {
    map: HashMap<String, CacheEntry<V>>,
    order: VecDeque<String>,
    capacity: usize,
}

impl<V> MemoryTier<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.map.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry<V>> {
        self.map.get_mut(key)
    }

    /// Marks `key` as most recently used.
    pub fn touch(&mut self, key: &str) {
        move_key_to_end(&mut self.order, key);
    }

    /// Inserts or replaces `key`, making it most recently used.
    ///
    /// When the tier is full and `key` is new, the least recently used entry
    /// is evicted first and returned so the caller can decide whether to
    /// demote it.
    pub fn insert(&mut self, key: String, entry: CacheEntry<V>) -> Option<(String, CacheEntry<V>)> {
        let evicted = if !self.map.contains_key(&key) && self.map.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        if self.map.insert(key.clone(), entry).is_some() {
            move_key_to_end(&mut self.order, &key);
        } else {
            self.order.push_back(key);
        }

        evicted
    }

    /// Pops the least recently used entry.
    pub fn evict_lru(&mut self) -> Option<(String, CacheEntry<V>)> {
        while let Some(key) = self.order.pop_front() {
            if let Some(entry) = self.map.remove(&key) {
                return Some((key, entry));
            }
        }
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        remove_key(&mut self.map, &mut self.order, key)
    }

    /// Drops every entry; returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.map.len();
        self.map.clear();
        self.order.clear();
        count
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    /// Keys from most to least recently used.
    pub fn lru_order(&self) -> Vec<String> {
        self.order.iter().rev().cloned().collect()
    }

    /// Keys whose entries are past `expires_at` at `now_ms`.
    pub fn expired_keys(&self, now_ms: u64) -> Vec<String> {
        self.map
            .iter()
            .filter(|(_, entry)| entry.is_expired(now_ms))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Sum of `size_bytes` over all entries. Reporting only.
    pub fn total_bytes(&self) -> usize {
        self.map.values().map(|entry| entry.size_bytes).sum()
    }
}
