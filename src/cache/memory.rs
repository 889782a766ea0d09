//! Memory Cache Module
//!
//! In-process map from key to value with a per-entry insertion time.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::entry::{MemoryEntry, Ttl};
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::cache::{Cache, Throttle};
use crate::error::Result;

// == Memory Cache ==
/// In-memory TTL cache.
///
/// Expiry is computed on read; reading never extends an entry's life. Every
/// `set` requests a full sweep, which the throttle lets through at most once
/// per `cleanup_interval`. Operations never suspend and never fail.
pub struct MemoryCache<V> {
    entries: Mutex<HashMap<String, MemoryEntry<V>>>,
    ttl: Ttl<V>,
    cleanup: Throttle,
    stats: StatsRecorder,
}

impl<V: Clone> MemoryCache<V> {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `ttl` - Fixed lifetime or per-value supplier, fixed for the cache's life
    /// * `cleanup_interval` - Minimum time between two sweeps
    pub fn new(ttl: impl Into<Ttl<V>>, cleanup_interval: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: ttl.into(),
            cleanup: Throttle::new(cleanup_interval),
            stats: StatsRecorder::default(),
        }
    }

    // == Get ==
    /// Returns a copy of the value if present and younger than its TTL.
    ///
    /// An expired entry is removed before reporting the miss.
    pub fn get_now(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(&self.ttl, Instant::now()),
        };

        if expired {
            entries.remove(key);
            self.stats.record_expired();
            debug!(key, "memory entry expired on read");
            return None;
        }

        self.stats.record_hit();
        entries.get(key).map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Overwrites `key` with a freshly stamped entry, then requests a sweep.
    pub fn set_now(&self, key: &str, value: V) {
        self.entries
            .lock()
            .insert(key.to_string(), MemoryEntry::new(value));
        self.cleanup.call(|| {
            self.cleanup_expired();
        });
    }

    // == Invalidate ==
    /// Removes `key`. Absent keys are ignored.
    pub fn invalidate_now(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    // == Cleanup Expired ==
    /// Removes every entry whose `inserted_at + ttl <= now`.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(&self.ttl, now));
            before - entries.len()
        };

        self.stats.record_sweep(removed);
        if removed > 0 {
            debug!(removed, "memory sweep removed expired entries");
        }
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    // == Length ==
    /// Number of stored entries, expired-but-unswept ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl<V> Cache for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Value = V;
    type Entry = V;

    async fn get(&self, key: &str) -> Result<Option<V>> {
        Ok(self.get_now(key))
    }

    async fn set(&self, key: &str, value: V) -> Result<V> {
        self.set_now(key, value.clone());
        Ok(value)
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        self.invalidate_now(key);
        Ok(())
    }
}
