//! Time-bounded in-memory response store.

use super::key::RequestKey;
use crate::transport::Payload;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    #[serde(rename = "max_age_ms", with = "crate::config::millis")]
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age: Duration::from_millis(300_000),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    evictions: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    value: Payload,
    stored_at: Instant,
}

#[derive(Default)]
struct Entries {
    values: HashMap<RequestKey, CacheEntry>,
    /// Epoch at which each key was last invalidated.
    invalidated: HashMap<RequestKey, u64>,
    cleared_at: u64,
    next_epoch: u64,
}

impl Entries {
    fn epoch(&self, key: &RequestKey) -> u64 {
        self.invalidated
            .get(key)
            .copied()
            .unwrap_or(0)
            .max(self.cleared_at)
    }

    fn bump(&mut self) -> u64 {
        self.next_epoch += 1;
        self.next_epoch
    }
}

/// Response cache for safe reads. Expired entries are evicted lazily on lookup.
///
/// Every key carries an invalidation epoch. A read that started before an
/// invalidation stores its result through [`set_if_current`](Self::set_if_current)
/// and is discarded, so a slow response never resurrects stale data.
pub struct ResponseCache {
    config: CacheConfig,
    entries: Mutex<Entries>,
    stats: AtomicStats,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(Entries::default()),
            stats: AtomicStats::default(),
        }
    }

    pub fn max_age(&self) -> Duration {
        self.config.max_age
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // No invariant spans a panic inside the critical sections below.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &RequestKey) -> Option<Payload> {
        if !self.config.enabled {
            return None;
        }
        let mut entries = self.lock();
        let max_age = self.config.max_age;
        let fresh = match entries
            .values
            .get(key)
            .map(|e| e.stored_at.elapsed() <= max_age)
        {
            Some(true) => entries.values.get(key).map(|e| e.value.clone()),
            Some(false) => {
                entries.values.remove(key);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => None,
        };
        match fresh {
            Some(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn set(&self, key: RequestKey, value: Payload) {
        if !self.config.enabled {
            return;
        }
        self.store(&mut self.lock(), key, value);
    }

    /// Current invalidation epoch of `key`. Capture it before starting a read
    /// and hand it to [`set_if_current`](Self::set_if_current) when the read lands.
    pub fn epoch(&self, key: &RequestKey) -> u64 {
        self.lock().epoch(key)
    }

    /// Store `value` only if `key` has not been invalidated or cleared since
    /// `epoch` was taken. Returns whether the value was stored.
    pub fn set_if_current(&self, key: RequestKey, value: Payload, epoch: u64) -> bool {
        if !self.config.enabled {
            return false;
        }
        let mut entries = self.lock();
        if entries.epoch(&key) != epoch {
            return false;
        }
        self.store(&mut entries, key, value);
        true
    }

    fn store(&self, entries: &mut Entries, key: RequestKey, value: Payload) {
        entries.values.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop the entry for `key` and advance its epoch, whether or not an
    /// entry was stored. Returns whether an entry was removed.
    pub fn invalidate(&self, key: &RequestKey) -> bool {
        let mut entries = self.lock();
        let epoch = entries.bump();
        entries.invalidated.insert(key.clone(), epoch);
        entries.values.remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        let epoch = entries.bump();
        entries.cleared_at = epoch;
        entries.invalidated.clear();
        entries.values.clear();
    }

    /// Number of stored entries, including ones that expired but were not yet looked up.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }
}
