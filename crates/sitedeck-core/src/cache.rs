// ── TTL cache ──
//
// Key/value store with per-entry expiry. Expired entries are evicted
// lazily on read; there is no size bound and no background sweeper.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Lifetime applied by [`TtlCache::set_default`].
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct Entry<V> {
    value: V,
    written: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.written) <= self.ttl
    }
}

/// Concurrent cache whose entries disappear once their TTL has elapsed.
///
/// Values are cloned out on read, so wrap large payloads in `Arc`.
pub struct TtlCache<V> {
    entries: DashMap<String, Entry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// The cached value, if present and not yet expired.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_fresh(now) {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove_if(key, |_, entry| !entry.is_fresh(now));
        None
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                written: Instant::now(),
                ttl,
            },
        );
    }

    /// Store `value` with [`DEFAULT_TTL`].
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, DEFAULT_TTL);
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
