use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::{QuotaMap, StorageBackend, StorageKind, DEFAULT_QUOTA_BYTES};
use crate::error::StoreError;

// One map per process, shared by every handle.
static SESSION_MAP: Lazy<RwLock<QuotaMap>> =
    Lazy::new(|| RwLock::new(QuotaMap::new(DEFAULT_QUOTA_BYTES)));

/// Session-scoped store: lives as long as the process.
///
/// Every `SessionStore` handle reads and writes the same process-global map,
/// so caches created at different times see each other's namespaced data.
/// The quota is fixed at [`DEFAULT_QUOTA_BYTES`].
///
/// # Examples
///
/// ```
/// use tiercache_core::{SessionStore, StorageBackend};
///
/// let a = SessionStore::shared();
/// let b = SessionStore::shared();
/// a.put("doc:session-example", b"v").unwrap();
/// assert_eq!(b.get("doc:session-example").unwrap(), Some(b"v".to_vec()));
/// b.remove("doc:session-example").unwrap();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStore {
    _private: (),
}

impl SessionStore {
    pub fn shared() -> Self {
        Self { _private: () }
    }
}

impl StorageBackend for SessionStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Session
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(SESSION_MAP.read().get(key))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        SESSION_MAP.write().put(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(SESSION_MAP.write().remove(key))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(SESSION_MAP.read().keys())
    }
}
