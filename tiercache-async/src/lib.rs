//! # Tiercache Async
//!
//! Timer-driven expiry sweeps for [`tiercache_core::TieredCache`] on Tokio.
//!
//! Reads already drop expired entries lazily; the scheduler additionally
//! runs [`TieredCache::cleanup`] on a fixed period so entries that are never
//! read again do not linger. The period stretches while the host reports
//! itself as running in the background.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tiercache_async::{CleanupScheduler, Visibility};
//! use tiercache_core::{CacheConfig, TieredCache};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = Arc::new(TieredCache::<String>::new(CacheConfig::default()));
//!     let scheduler = CleanupScheduler::for_cache(Arc::clone(&cache));
//!
//!     // Sweep three times less often while hidden
//!     scheduler.set_visibility(Visibility::Background);
//!
//!     scheduler.shutdown().await;
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tiercache_core::{duration_to_ms, CacheConfig, TieredCache};

/// Shortest period the scheduler will wait between sweeps.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Whether the host application is currently in front of the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Foreground,
    Background,
}

/// Something the scheduler can sweep.
pub trait Sweeper: Send + Sync + 'static {
    /// Runs one sweep and returns how many entries it removed.
    fn sweep(&self) -> usize;
}

impl<V> Sweeper for TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    fn sweep(&self) -> usize {
        self.cleanup()
    }
}

/// Sweep periods for a [`CleanupScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Period while in the foreground.
    pub base_interval: Duration,
    /// Factor applied to `base_interval` while in the background.
    pub background_multiplier: u32,
}

impl SchedulerConfig {
    pub fn new(base_interval: Duration, background_multiplier: u32) -> Self {
        Self {
            base_interval,
            background_multiplier,
        }
    }

    /// Takes `cleanup_interval` and `background_multiplier` from a cache config.
    pub fn from_cache_config(config: &CacheConfig) -> Self {
        Self::new(config.cleanup_interval(), config.background_multiplier)
    }

    /// Period to wait between sweeps under `visibility`, never shorter
    /// than [`MIN_INTERVAL`].
    pub fn interval_for(&self, visibility: Visibility) -> Duration {
        let base = self.base_interval.max(MIN_INTERVAL);
        match visibility {
            Visibility::Foreground => base,
            Visibility::Background => base.saturating_mul(self.background_multiplier.max(1)),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_cache_config(&CacheConfig::default())
    }
}

/// Runs a [`Sweeper`] periodically on a Tokio task.
///
/// Each sweep runs on the blocking pool, since it may touch the disk.
/// The first sweep happens one period after start. Changing the visibility
/// cancels the pending tick and starts a fresh period at the new length.
/// The task stops on [`shutdown`](Self::shutdown) or when the scheduler is
/// dropped.
pub struct CleanupScheduler {
    config: SchedulerConfig,
    visibility_tx: watch::Sender<Visibility>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CleanupScheduler {
    /// Spawns the sweep task for `sweeper`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn start<S: Sweeper>(sweeper: Arc<S>, config: SchedulerConfig) -> Self {
        let (visibility_tx, visibility_rx) = watch::channel(Visibility::Foreground);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        info!(
            interval_ms = duration_to_ms(config.interval_for(Visibility::Foreground)),
            background_multiplier = config.background_multiplier,
            "cleanup scheduler started"
        );
        let handle = tokio::spawn(run(sweeper, config, visibility_rx, shutdown_rx));

        Self {
            config,
            visibility_tx,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Starts sweeping `cache` with the periods from its own config.
    pub fn for_cache<V>(cache: Arc<TieredCache<V>>) -> Self
    where
        V: Clone + Serialize + DeserializeOwned + Send + 'static,
    {
        let config = SchedulerConfig::from_cache_config(cache.config());
        Self::start(cache, config)
    }

    /// Reports a visibility change; takes effect immediately.
    pub fn set_visibility(&self, visibility: Visibility) {
        let previous = self.visibility_tx.send_replace(visibility);
        if previous != visibility {
            debug!(?previous, ?visibility, "visibility changed");
        }
    }

    pub fn visibility(&self) -> Visibility {
        *self.visibility_tx.borrow()
    }

    /// Period currently in effect.
    pub fn current_interval(&self) -> Duration {
        self.config.interval_for(self.visibility())
    }

    /// Stops the task and waits for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("cleanup scheduler stopped");
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run<S: Sweeper>(
    sweeper: Arc<S>,
    config: SchedulerConfig,
    mut visibility: watch::Receiver<Visibility>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let period = config.interval_for(*visibility.borrow_and_update());
        tokio::select! {
            _ = tokio::time::sleep(period) => {
                let sweeper = Arc::clone(&sweeper);
                match tokio::task::spawn_blocking(move || sweeper.sweep()).await {
                    Ok(removed) => {
                        debug!(removed, period_ms = duration_to_ms(period), "scheduled sweep finished");
                    }
                    Err(e) => warn!(error = %e, "scheduled sweep failed"),
                }
            }
            changed = visibility.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut shutdown => break,
        }
    }
}
