//! Expiring cache of AI answers keyed by query text.
//!
//! Entries are never evicted. A stale entry reads as a miss and is replaced
//! by the next `put` for the same key, so memory grows with the number of
//! distinct queries.

use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    value: String,
    inserted_at: Instant,
}

pub struct TtlCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_at(key, Instant::now())
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put_at(key, value, Instant::now());
    }

    /// Lookup as of `now`. Hits only while `now - inserted_at < ttl`.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<&str> {
        self.entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.inserted_at) < self.ttl)
            .map(|entry| entry.value.as_str())
    }

    pub fn put_at(&mut self, key: impl Into<String>, value: impl Into<String>, now: Instant) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value: value.into(),
                inserted_at: now,
            },
        );
    }

    /// Number of entries held, stale ones included.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
