//! Time-bounded memoization in front of upstream calls
//!
//! Entries expire a fixed time after insertion regardless of access. A
//! background task sweeps expired entries on a fixed interval so memory is
//! released even when a key is never requested again.

use crate::types::CacheStats;
use moka::future::Cache;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Expiry and sweep timing for one cache instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub sweep_interval: Duration,
}

impl CacheConfig {
    pub const fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            ttl,
            sweep_interval,
        }
    }
}

/// Typed TTL cache with single-flight fills
pub struct TtlCache<K, V> {
    name: &'static str,
    inner: Cache<K, V>,
    hits: AtomicU64,
    misses: AtomicU64,
    sweeper: Option<JoinHandle<()>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create the cache and start its sweeper on the current Tokio runtime
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        let inner = Cache::builder()
            .name(name)
            .time_to_live(config.ttl)
            .build();

        let sweeper = match tokio::runtime::Handle::try_current() {
            _ if config.sweep_interval.is_zero() => {
                warn!(cache = name, "Zero sweep interval, expired entries will not be swept");
                None
            }
            Ok(handle) => Some(handle.spawn(sweep_loop(
                name,
                inner.clone(),
                config.sweep_interval,
            ))),
            Err(_) => {
                warn!(cache = name, "No Tokio runtime, expired entries will not be swept");
                None
            }
        };

        Self {
            name,
            inner,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sweeper,
        }
    }

    /// Return the cached value for `key`, or run `compute` and cache its result
    ///
    /// Concurrent callers missing on the same key share a single `compute`;
    /// the others wait for its result. Errors are handed to every waiter and
    /// are not cached.
    pub async fn get_or_compute<F, E>(&self, key: K, compute: F) -> Result<V, Arc<E>>
    where
        F: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        let entry = self.inner.entry(key).or_try_insert_with(compute).await?;

        if entry.is_fresh() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(cache = self.name, "Cache miss");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        Ok(entry.into_value())
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    /// Remove expired entries now instead of waiting for the sweeper
    pub async fn sweep(&self) {
        self.inner.run_pending_tasks().await;
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<K, V> Drop for TtlCache<K, V> {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

async fn sweep_loop<K, V>(name: &'static str, cache: Cache<K, V>, every: Duration)
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        cache.run_pending_tasks().await;
        debug!(cache = name, entries = cache.entry_count(), "Swept cache");
    }
}
