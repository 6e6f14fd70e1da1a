//! # Tiercache Core
//!
//! Building blocks for a two-tier key-value cache: a bounded in-memory LRU
//! tier in front of a persistent byte store, with TTL expiry, promotion and
//! demotion between the tiers, and a compact on-disk record format.
//!
//! ## Features
//!
//! - **Memory Tier**: LRU ordering with a fixed entry capacity
//! - **Persistent Tier**: namespaced byte store with a quota, backed by a
//!   directory, a process-wide session map, or a per-instance stand-in
//! - **Promotion / Demotion**: hot entries survive memory eviction by moving
//!   to storage; persisted hits move back into memory
//! - **TTL Support**: lazy expiry on read plus an active sweep
//! - **Record Codec**: versioned JSON records with optional run-length
//!   compression
//! - **Statistics**: lock-free counters and serializable snapshots
//!
//! ## Module Organization
//!
//! - [`cache_entry`] - entry with timing and hit metadata
//! - [`codec`] - record encoding and decoding
//! - [`storage`] - backends, quota handling and backend selection
//! - [`memory_tier`] - the LRU memory tier
//! - [`promotion`] - demotion and write-through rules
//! - [`tiered_cache`] - the cache facade
//!
mod builder;
mod clock;
mod config;
mod error;
mod keys;
mod stats;
mod sweep;

pub mod cache_entry;
pub mod codec;
pub mod memory_tier;
pub mod promotion;
pub mod storage;
pub mod tiered_cache;
pub mod utils;

pub use builder::CacheBuilder;
pub use cache_entry::CacheEntry;
pub use clock::{duration_to_ms, Clock, ManualClock, SystemClock};
pub use codec::{ItemCodec, FORMAT_VERSION};
pub use config::{CacheConfig, DEFAULT_NAMESPACE};
pub use error::{DecodeError, EncodeError, PersistError, StoreError};
pub use keys::{canonical_key, normalize_key, CacheableKey};
pub use memory_tier::MemoryTier;
pub use promotion::PromotionPolicy;
pub use stats::{CacheStats, StatsSnapshot};
pub use storage::{
    DurableStore, MemoryStore, PersistentStore, SessionStore, StorageBackend, StorageKind,
    DEFAULT_QUOTA_BYTES,
};
pub use sweep::SweepGuard;
pub use tiered_cache::{IntoPreloadItem, PreloadItem, SetOptions, TieredCache};
