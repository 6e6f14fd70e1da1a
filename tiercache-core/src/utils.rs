use crate::CacheEntry;
use std::collections::{HashMap, VecDeque};

/// Moves a key to the back of the order queue (marks it most recently used).
///
/// # Behavior
///
/// - If the key exists in the queue, it is removed from its current position and pushed to the back
/// - If the key doesn't exist, the queue remains unchanged
///
/// # Performance
///
/// O(n) in the length of the queue.
///
/// # Examples
///
/// ```
/// use std::collections::VecDeque;
/// use tiercache_core::utils::move_key_to_end;
///
/// let mut order = VecDeque::from(vec!["key1".to_string(), "key2".to_string(), "key3".to_string()]);
///
/// move_key_to_end(&mut order, "key2");
/// assert_eq!(order.back().unwrap(), "key2");
///
/// // Unknown keys are ignored
/// move_key_to_end(&mut order, "key4");
/// assert_eq!(order.len(), 3);
/// ```
pub fn move_key_to_end(order: &mut VecDeque<String>, key: &str) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        if let Some(k) = order.remove(pos) {
            order.push_back(k);
        }
    }
}

/// Removes a key from both the entry map and the order queue.
///
/// The two structures are always updated together so that no key ever lives
/// in one without the other. Returns the removed entry, if the map held one.
///
/// # Examples
///
/// ```
/// use std::collections::{HashMap, VecDeque};
/// use tiercache_core::{CacheEntry, utils::remove_key};
///
/// let mut map = HashMap::new();
/// let mut order = VecDeque::new();
/// map.insert("key1".to_string(), CacheEntry::new("key1", 42, 0, 1_000, 2));
/// order.push_back("key1".to_string());
///
/// let removed = remove_key(&mut map, &mut order, "key1");
/// assert_eq!(removed.map(|e| e.value), Some(42));
/// assert!(map.is_empty());
/// assert!(order.is_empty());
/// ```
pub fn remove_key<V>(
    map: &mut HashMap<String, CacheEntry<V>>,
    order: &mut VecDeque<String>,
    key: &str,
) -> Option<CacheEntry<V>> {
    let removed = map.remove(key);
    if let Some(pos) = order.iter().position(|k| k == key) {
        order.remove(pos);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(keys: &[&str]) -> VecDeque<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_move_key_to_end_existing_key() {
        let mut order = queue(&["key1", "key2", "key3"]);
        move_key_to_end(&mut order, "key2");
        assert_eq!(order, queue(&["key1", "key3", "key2"]));
    }

    #[test]
    fn test_move_key_to_end_first_key() {
        let mut order = queue(&["key1", "key2", "key3"]);
        move_key_to_end(&mut order, "key1");
        assert_eq!(order, queue(&["key2", "key3", "key1"]));
    }

    #[test]
    fn test_move_key_to_end_last_key() {
        let mut order = queue(&["key1", "key2", "key3"]);
        move_key_to_end(&mut order, "key3");
        assert_eq!(order, queue(&["key1", "key2", "key3"]));
    }

    #[test]
    fn test_move_key_to_end_empty_queue() {
        let mut order = VecDeque::new();
        move_key_to_end(&mut order, "key1");
        assert!(order.is_empty());
    }

    #[test]
    fn test_remove_key_from_both() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), CacheEntry::new("a", 1, 0, 10, 1));
        map.insert("b".to_string(), CacheEntry::new("b", 2, 0, 10, 1));
        let mut order = queue(&["a", "b"]);

        let removed = remove_key(&mut map, &mut order, "a");
        assert_eq!(removed.map(|e| e.value), Some(1));
        assert_eq!(order, queue(&["b"]));
        assert!(!map.contains_key("a"));
    }

    #[test]
    fn test_remove_key_missing() {
        let mut map: HashMap<String, CacheEntry<i32>> = HashMap::new();
        let mut order = queue(&["orphan"]);

        // An orphaned order slot is still cleaned up
        assert!(remove_key(&mut map, &mut order, "orphan").is_none());
        assert!(order.is_empty());
    }
}
