//! # Persistent Storage
//!
//! The persistent tier is a byte-oriented key-value store with a byte quota.
//! [`StorageBackend`] is the capability every store offers; three
//! implementations exist:
//!
//! - [`DurableStore`] - one file per key in a directory, survives restarts
//! - [`SessionStore`] - a process-global map, gone when the process exits
//! - [`MemoryStore`] - a per-instance map, the stand-in of last resort
//!
//! [`PersistentStore`] binds one backend to one namespace and is what the
//! cache talks to. It picks its backend by probing candidates in order.

mod adapter;
mod durable;
mod memory;
mod session;

pub use adapter::PersistentStore;
pub use durable::DurableStore;
pub use memory::MemoryStore;
pub use session::SessionStore;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::StoreError;

/// Default byte quota for a backend.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Which kind of backend is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Durable,
    Session,
    Memory,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::Durable => "durable",
            StorageKind::Session => "session",
            StorageKind::Memory => "memory",
        };
        f.write_str(name)
    }
}

/// A byte-oriented key-value store.
///
/// Keys are full storage keys (already namespaced by the caller).
/// Implementations must be safe to share between cache instances.
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> StorageKind;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `value` under `key` in one shot, replacing any previous value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Removes `key`; returns whether it was present.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// Snapshot of every key currently stored.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Checks the backend is usable with a trivial write and delete.
    fn probe(&self) -> Result<(), StoreError> {
        let key = format!("__tiercache_probe_{:016x}", fastrand::u64(..));
        self.put(&key, b"1")?;
        self.remove(&key).map(|_| ())
    }
}

/// Map with byte accounting shared by the in-process backends.
///
/// Usage is `key.len() + value.len()` summed over all entries.
#[derive(Debug)]
pub(crate) struct QuotaMap {
    entries: HashMap<String, Vec<u8>>,
    used: usize,
    quota: usize,
}

impl QuotaMap {
    pub(crate) fn new(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            used: 0,
            quota,
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    pub(crate) fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let existing = self
            .entries
            .get(key)
            .map(|v| key.len() + v.len())
            .unwrap_or(0);
        let incoming = key.len() + value.len();
        let projected = self.used - existing + incoming;

        if projected > self.quota {
            return Err(StoreError::QuotaExceeded {
                requested: incoming,
                quota: self.quota,
            });
        }

        self.entries.insert(key.to_string(), value.to_vec());
        self.used = projected;
        Ok(())
    }

    pub(crate) fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(v) => {
                self.used -= key.len() + v.len();
                true
            }
            None => false,
        }
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }
}
