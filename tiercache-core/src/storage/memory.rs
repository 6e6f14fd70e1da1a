use parking_lot::RwLock;

use super::{QuotaMap, StorageBackend, StorageKind, DEFAULT_QUOTA_BYTES};
use crate::error::StoreError;

/// In-memory stand-in for a persistent store.
///
/// Always available, never persists anything past the life of the value.
/// Wrap it in an `Arc` to share it between caches.
#[derive(Debug)]
pub struct MemoryStore {
    map: RwLock<QuotaMap>,
}

impl MemoryStore {
    pub fn new(quota_bytes: usize) -> Self {
        Self {
            map: RwLock::new(QuotaMap::new(quota_bytes)),
        }
    }

    /// Bytes currently accounted against the quota.
    pub fn used_bytes(&self) -> usize {
        self.map.read().used()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA_BYTES)
    }
}

impl StorageBackend for MemoryStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Memory
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.map.read().get(key))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.map.write().put(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.map.write().remove(key))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.map.read().keys())
    }
}
