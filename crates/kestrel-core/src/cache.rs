//! Time-to-live key/value cache.
//!
//! Expired entries are treated as absent on lookup but are only evicted in
//! bulk, when the entry count reaches twice the tracked working size.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::trace;

use crate::clock::{Clock, SystemClock};

/// Floor for the working-size threshold.
pub const MIN_SIZE: usize = 10;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct Store<V> {
    size: usize,
    values: HashMap<String, Entry<V>>,
}

impl<V> Store<V> {
    fn cleanup(&mut self, now: Instant) {
        let before = self.values.len();
        self.values.retain(|_, entry| entry.expires_at > now);
        self.size = self.values.len().max(MIN_SIZE);
        trace!(
            evicted = before - self.values.len(),
            size = self.size,
            "Cache cleanup"
        );
    }
}

/// A string-keyed cache with per-entry expiry.
#[derive(Debug)]
pub struct TtlCache<V, C: Clock = SystemClock> {
    clock: C,
    store: RwLock<Store<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, C: Clock> TtlCache<V, C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            store: RwLock::new(Store {
                size: MIN_SIZE,
                values: HashMap::new(),
            }),
        }
    }

    /// Returns the value stored under `key` unless it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        self.store
            .read()
            .values
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key` for `ttl`.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut store = self.store.write();

        if store.values.len() >= store.size * 2 {
            store.cleanup(self.clock.now());
        }

        let entry = Entry {
            value,
            expires_at: self.clock.deadline(ttl),
        };
        store.values.insert(key.into(), entry);
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.store.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
