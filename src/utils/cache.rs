// src/utils/cache.rs
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry<V> {
    // None never expires
    expires_at: Option<Instant>,
    value: V,
}

/// Thread-safe key/value cache with a TTL per entry.
///
/// Expired entries are evicted lazily, when `get` or `is_set` finds them.
pub struct TtlCache<V, C: Clock = SystemClock> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    clock: C,
}

impl<V: Clone> TtlCache<V, SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<V: Clone> Default for TtlCache<V, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, C: Clock> TtlCache<V, C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Value for `key`, unless it is missing or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        if Self::expired(entries.get(key)?, now) {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = self.clock.now().checked_add(ttl);
        self.entries
            .lock()
            .insert(key.into(), Entry { expires_at, value });
    }

    /// `set` with [`DEFAULT_TTL`].
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.set(key, value, DEFAULT_TTL);
    }

    pub fn is_set(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        match entries.get(key) {
            None => false,
            Some(entry) if Self::expired(entry, now) => {
                entries.remove(key);
                false
            }
            Some(_) => true,
        }
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.lock().remove(key).map(|entry| entry.value)
    }

    pub fn remove_by_prefix(&self, prefix: &str) {
        self.entries.lock().retain(|key, _| !key.starts_with(prefix));
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(entry: &Entry<V>, now: Instant) -> bool {
        entry.expires_at.is_some_and(|at| now > at)
    }
}
