use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{DurableStore, MemoryStore, SessionStore, StorageBackend, StorageKind};
use crate::clock::Clock;
use crate::codec::ItemCodec;
use crate::config::CacheConfig;
use crate::error::StoreError;

/// A storage backend seen through one namespace.
///
/// Every key passed in is a canonical cache key; the adapter stores it as
/// `namespace:key` and only ever reads, lists or deletes keys carrying its
/// own prefix. Several adapters may share one backend.
///
/// Writes rejected for quota get one chance at recovery: the adapter sweeps
/// expired and corrupt records from its namespace and retries once.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tiercache_core::{ItemCodec, MemoryStore, PersistentStore, StorageBackend, SystemClock};
///
/// let backend: Arc<dyn StorageBackend> = Arc::new(MemoryStore::default());
/// let users = PersistentStore::new("users", backend.clone(), ItemCodec::default(), Arc::new(SystemClock));
/// let orders = PersistentStore::new("orders", backend, ItemCodec::default(), Arc::new(SystemClock));
///
/// users.put("1", b"alice").unwrap();
/// assert_eq!(users.get("1"), Some(b"alice".to_vec()));
/// assert_eq!(orders.get("1"), None);
/// ```
pub struct PersistentStore {
    backend: Arc<dyn StorageBackend>,
    namespace: String,
    prefix: String,
    codec: ItemCodec,
    clock: Arc<dyn Clock>,
}

impl PersistentStore {
    pub fn new(
        namespace: impl Into<String>,
        backend: Arc<dyn StorageBackend>,
        codec: ItemCodec,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let namespace = namespace.into();
        let prefix = format!("{}:", namespace);
        Self {
            backend,
            namespace,
            prefix,
            codec,
            clock,
        }
    }

    /// Opens the first usable backend for `config`.
    ///
    /// Candidates: the durable store (only when `storage_dir` is set), then
    /// the session store, then an in-memory stand-in that always works.
    pub fn open(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let mut candidates: Vec<Arc<dyn StorageBackend>> = Vec::new();
        if let Some(dir) = &config.storage_dir {
            candidates.push(Arc::new(DurableStore::new(
                dir.clone(),
                config.storage_quota_bytes,
            )));
        }
        candidates.push(Arc::new(SessionStore::shared()));

        Self::open_with_candidates(config, candidates, clock)
    }

    /// Probes `candidates` in order and binds the first that passes.
    ///
    /// Falls back to a fresh [`MemoryStore`] when none does, so the result is
    /// always usable.
    pub fn open_with_candidates(
        config: &CacheConfig,
        candidates: Vec<Arc<dyn StorageBackend>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let backend = select_backend(candidates).unwrap_or_else(|| {
            info!(
                namespace = %config.namespace,
                "no persistent storage available, using in-memory stand-in"
            );
            Arc::new(MemoryStore::new(config.storage_quota_bytes))
        });

        Self::new(
            config.namespace.clone(),
            backend,
            ItemCodec::new(config.compression),
            clock,
        )
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kind(&self) -> StorageKind {
        self.backend.kind()
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Reads the record stored for `key`.
    ///
    /// Backend failures are logged and read as absent.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.backend.get(&self.namespaced(key)) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "persistent read failed");
                None
            }
        }
    }

    /// Writes the record for `key` in one shot.
    ///
    /// On `QuotaExceeded` the namespace is swept and the write retried once;
    /// a second failure is returned to the caller.
    pub fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let full_key = self.namespaced(key);
        match self.backend.put(&full_key, bytes) {
            Err(StoreError::QuotaExceeded { .. }) => {
                let freed = self.sweep_expired();
                debug!(
                    namespace = %self.namespace,
                    key,
                    freed,
                    "storage quota exceeded, retrying after sweep"
                );
                self.backend.put(&full_key, bytes)
            }
            other => other,
        }
    }

    /// Removes `key`; returns whether a record was there.
    pub fn remove(&self, key: &str) -> bool {
        match self.backend.remove(&self.namespaced(key)) {
            Ok(removed) => removed,
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "persistent remove failed");
                false
            }
        }
    }

    /// Calls `f` with every canonical key stored under this namespace.
    ///
    /// Works over a snapshot and never mutates the store; callers that want
    /// to delete should collect keys first and act afterwards.
    pub fn for_each_key<F: FnMut(&str)>(&self, mut f: F) {
        let keys = match self.backend.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "persistent key listing failed");
                return;
            }
        };
        for key in keys.iter() {
            if let Some(canonical) = key.strip_prefix(&self.prefix) {
                f(canonical);
            }
        }
    }

    /// Canonical keys under this namespace.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.for_each_key(|k| keys.push(k.to_string()));
        keys
    }

    /// Removes every record in this namespace; other keys are untouched.
    pub fn clear_namespace(&self) -> usize {
        self.keys().iter().filter(|key| self.remove(key)).count()
    }

    /// Removes records that are past `expires_at` or fail to decode.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_keys().len()
    }

    /// Like [`sweep_expired`](Self::sweep_expired), returning the removed keys.
    pub fn sweep_expired_keys(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        let doomed: Vec<String> = self
            .keys()
            .into_iter()
            .filter(|key| match self.get(key) {
                Some(bytes) => match self.codec.inspect(&bytes) {
                    Ok(expires_at) => now > expires_at,
                    Err(e) => {
                        debug!(namespace = %self.namespace, key = %key, error = %e, "removing corrupt record");
                        true
                    }
                },
                None => false,
            })
            .collect();

        doomed.into_iter().filter(|key| self.remove(key)).collect()
    }
}

fn select_backend(candidates: Vec<Arc<dyn StorageBackend>>) -> Option<Arc<dyn StorageBackend>> {
    for candidate in candidates {
        match candidate.probe() {
            Ok(()) => {
                info!(kind = %candidate.kind(), "selected persistent storage backend");
                return Some(candidate);
            }
            Err(e) => {
                warn!(kind = %candidate.kind(), error = %e, "storage backend probe failed, trying next");
            }
        }
    }
    None
}
