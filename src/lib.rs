//! # Tiercache
//!
//! A two-tier key-value cache: a small LRU memory tier in front of a
//! persistent byte store, with TTL expiry, promotion of persisted hits,
//! demotion of hot evicted entries and automatic quota recovery.
//!
//! ## Features
//!
//! - **Two tiers**: fast bounded memory, larger persistent storage
//! - **Storage fallback**: a directory-backed store when configured, else a
//!   process-wide session store, else a per-instance in-memory stand-in
//! - **TTL**: lazy expiry on every read plus periodic sweeps
//! - **Namespaces**: several caches can share one backend without clashing
//! - **Never throws**: failures become `false`/`None`/`0` and an error count
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use tiercache::{CacheConfig, SetOptions, TieredCache};
//!
//! let cache: TieredCache<String> =
//!     TieredCache::new(CacheConfig::default().with_namespace("quickstart"));
//!
//! cache.set("greeting", "hello".to_string());
//! cache.set_with(
//!     "session",
//!     "token".to_string(),
//!     SetOptions::new().ttl(Duration::from_secs(60)).persistent(),
//! );
//!
//! assert_eq!(cache.get("greeting"), Some("hello".to_string()));
//! assert!(cache.has("session"));
//! assert_eq!(cache.stats().hits, 1);
//! # cache.clear(None);
//! ```
//!
//! ## Clearing by Pattern
//!
//! ```rust
//! use tiercache::{CacheConfig, Regex, TieredCache};
//!
//! let cache: TieredCache<u32> =
//!     TieredCache::new(CacheConfig::default().with_namespace("pattern_docs"));
//! cache.set("user_1", 1);
//! cache.set("user_2", 2);
//! cache.set("order_1", 3);
//!
//! let removed = cache.clear(Some(&Regex::new("^user_").unwrap()));
//! assert_eq!(removed, 2);
//! # cache.clear(None);
//! ```
//!
//! ## Background Sweeps
//!
//! With the default `scheduler` feature, [`CleanupScheduler`] runs
//! [`TieredCache::cleanup`] on a Tokio timer, stretching the period while
//! the application reports [`Visibility::Background`].
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tiercache::{CacheConfig, CleanupScheduler, TieredCache};
//!
//! let cache = Arc::new(TieredCache::<String>::new(CacheConfig::default()));
//! let scheduler = CleanupScheduler::for_cache(Arc::clone(&cache));
//! ```

pub use regex::Regex;

pub use tiercache_core::*;

#[cfg(feature = "scheduler")]
pub use tiercache_async::{CleanupScheduler, SchedulerConfig, Sweeper, Visibility};
