use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::duration_to_ms;
use crate::storage::DEFAULT_QUOTA_BYTES;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "tiercache";

/// Cache configuration.
///
/// Every field has a default, so a config can be built with
/// [`CacheConfig::default`] plus `with_*` setters, or loaded from JSON where
/// any subset of the camelCase keys may appear.
///
/// # Fields
///
/// * `max_memory_size` - Memory tier capacity in entries (default 50)
/// * `max_storage_size` - Advisory persistent entry count (default 200); exceeding it
///   is only logged
/// * `default_ttl_ms` - TTL for entries set without one (default one hour)
/// * `cleanup_interval_ms` - Period of the active sweep in foreground (default five minutes)
/// * `compression` - Run-length pass on persisted records (default on)
/// * `namespace` - Prefix isolating this cache in a shared store
/// * `background_multiplier` - Sweep period factor while in background (default 3)
/// * `persist_threshold_bytes` - Entries larger than this go straight to storage (default 10 KiB)
/// * `storage_dir` - Directory for the durable backend; `None` skips it
/// * `storage_quota_bytes` - Byte quota for the durable and in-memory backends
///
/// # Examples
///
/// ```
/// use tiercache_core::CacheConfig;
///
/// let config = CacheConfig::from_json(r#"{"maxMemorySize": 10, "defaultTTL": 5000}"#).unwrap();
/// assert_eq!(config.max_memory_size, 10);
/// assert_eq!(config.default_ttl_ms, 5000);
/// assert_eq!(config.max_storage_size, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    pub max_memory_size: usize,
    pub max_storage_size: usize,
    #[serde(rename = "defaultTTL")]
    pub default_ttl_ms: u64,
    #[serde(rename = "cleanupInterval")]
    pub cleanup_interval_ms: u64,
    pub compression: bool,
    pub namespace: String,
    pub background_multiplier: u32,
    pub persist_threshold_bytes: usize,
    pub storage_dir: Option<PathBuf>,
    pub storage_quota_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_memory_size: 50,
            max_storage_size: 200,
            default_ttl_ms: 3_600_000,
            cleanup_interval_ms: 300_000,
            compression: true,
            namespace: DEFAULT_NAMESPACE.to_string(),
            background_multiplier: 3,
            persist_threshold_bytes: 10 * 1024,
            storage_dir: None,
            storage_quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

impl CacheConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    pub fn with_max_memory_size(mut self, entries: usize) -> Self {
        self.max_memory_size = entries;
        self
    }

    pub fn with_max_storage_size(mut self, entries: usize) -> Self {
        self.max_storage_size = entries;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = duration_to_ms(ttl);
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval_ms = duration_to_ms(interval);
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_background_multiplier(mut self, factor: u32) -> Self {
        self.background_multiplier = factor;
        self
    }

    pub fn with_persist_threshold_bytes(mut self, bytes: usize) -> Self {
        self.persist_threshold_bytes = bytes;
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn with_storage_quota_bytes(mut self, bytes: usize) -> Self {
        self.storage_quota_bytes = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.max_memory_size, 50);
        assert_eq!(config.max_storage_size, 200);
        assert_eq!(config.default_ttl(), Duration::from_secs(3600));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(300));
        assert!(config.compression);
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.background_multiplier, 3);
        assert!(config.storage_dir.is_none());
    }

    #[test]
    fn test_from_json_full() {
        let config = CacheConfig::from_json(
            r#"{
                "maxMemorySize": 5,
                "maxStorageSize": 7,
                "defaultTTL": 1000,
                "cleanupInterval": 2000,
                "compression": false,
                "namespace": "app",
                "storageDir": "/tmp/x"
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_memory_size, 5);
        assert_eq!(config.max_storage_size, 7);
        assert_eq!(config.default_ttl_ms, 1000);
        assert_eq!(config.cleanup_interval_ms, 2000);
        assert!(!config.compression);
        assert_eq!(config.namespace, "app");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        assert!(CacheConfig::from_json(r#"{"maxMemorySize": "many"}"#).is_err());
    }

    #[test]
    fn test_setters_chain() {
        let config = CacheConfig::default()
            .with_max_memory_size(3)
            .with_default_ttl(Duration::from_millis(250))
            .with_namespace("ns")
            .with_compression(false);
        assert_eq!(config.max_memory_size, 3);
        assert_eq!(config.default_ttl_ms, 250);
        assert_eq!(config.namespace, "ns");
        assert!(!config.compression);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let config = CacheConfig::default()
            .with_default_ttl(Duration::MAX)
            .with_cleanup_interval(Duration::from_secs(u64::MAX));
        assert_eq!(config.default_ttl_ms, u64::MAX);
        assert_eq!(config.cleanup_interval_ms, u64::MAX);
    }
}
