//! Builder API for creating tiered cache instances.
//!
//! [`TieredCache::new`] covers the common case. The builder is for wiring in
//! a specific storage backend (for instance one shared by several caches
//! under different namespaces) or a controllable clock in tests.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::codec::ItemCodec;
use crate::config::CacheConfig;
use crate::storage::{PersistentStore, StorageBackend};
use crate::tiered_cache::TieredCache;

/// Builder for [`TieredCache`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tiercache_core::{CacheBuilder, CacheConfig, MemoryStore, TieredCache};
///
/// let shared = Arc::new(MemoryStore::default());
///
/// let users: TieredCache<String> = CacheBuilder::new()
///     .config(CacheConfig::default().with_namespace("users"))
///     .backend(shared.clone())
///     .build();
/// let orders: TieredCache<String> = CacheBuilder::new()
///     .config(CacheConfig::default().with_namespace("orders"))
///     .backend(shared)
///     .build();
///
/// users.set("1", "alice".to_string());
/// assert_eq!(orders.get("1"), None);
/// ```
#[derive(Default)]
pub struct CacheBuilder {
    config: CacheConfig,
    backend: Option<Arc<dyn StorageBackend>>,
    candidates: Option<Vec<Arc<dyn StorageBackend>>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds this backend directly, skipping the availability probe.
    pub fn backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Probes these backends in order instead of the default chain.
    ///
    /// Ignored when [`backend`](Self::backend) is set.
    pub fn candidates(mut self, candidates: Vec<Arc<dyn StorageBackend>>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    /// Time source for expiry; the system clock when unset.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build<V>(self) -> TieredCache<V>
    where
        V: Clone + Serialize + DeserializeOwned,
    {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let store = match (self.backend, self.candidates) {
            (Some(backend), _) => PersistentStore::new(
                self.config.namespace.clone(),
                backend,
                ItemCodec::new(self.config.compression),
                Arc::clone(&clock),
            ),
            (None, Some(candidates)) => {
                PersistentStore::open_with_candidates(&self.config, candidates, Arc::clone(&clock))
            }
            (None, None) => PersistentStore::open(&self.config, Arc::clone(&clock)),
        };

        TieredCache::from_parts(self.config, store, clock)
    }
}
