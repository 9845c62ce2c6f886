//! Expiring key/timestamp cache
//!
//! Backing store for debouncing: key → last-seen instant, with an absolute
//! hard expiration applied on insert. The hard ceiling bounds memory growth
//! for keys that are never revisited. It also caps every caller-requested
//! debounce window: a 60 s window stops blocking once the 10 s ceiling
//! elapses.
//!
//! The struct itself is not synchronized; `DebounceService` owns it behind
//! a mutex so one debounce decision spans all scopes under a single lock.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    stamped_at: Instant,
    expires_at: Instant,
}

/// TTL key/timestamp store with lazy and swept eviction.
#[derive(Debug)]
pub struct ExpiringCache {
    hard_ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl ExpiringCache {
    /// `hard_ttl` is the absolute expiration applied to every entry,
    /// regardless of the debounce window later asked about.
    pub fn new(hard_ttl: Duration) -> Self {
        Self {
            hard_ttl,
            entries: HashMap::new(),
        }
    }

    /// Stamp `key` with the current instant.
    pub fn insert(&mut self, key: &str) {
        let now = Instant::now();
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                stamped_at: now,
                expires_at: now + self.hard_ttl,
            },
        );
    }

    /// True iff `key` was stamped less than `window` ago and the hard
    /// expiration has not elapsed. Expired entries are evicted on lookup.
    pub fn is_blocked(&mut self, key: &str, window: Duration) -> bool {
        let now = Instant::now();

        let Some(entry) = self.entries.get(key) else {
            return false;
        };

        if now >= entry.expires_at {
            self.entries.remove(key);
            return false;
        }

        now.duration_since(entry.stamped_at) < window
    }

    /// Drop every entry whose hard expiration has elapsed.
    pub fn sweep(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| now < entry.expires_at);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
