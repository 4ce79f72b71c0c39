//! In-memory LRU record of URLs known to be fetched.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::ports::MembershipCachePort;

/// Default number of URLs remembered.
pub const DEFAULT_CACHE_CAPACITY: usize = 500;

/// Bounded membership set with least-recently-used eviction.
///
/// One instance is constructed by the host and shared by every loader via
/// `Arc`. Writes are idempotent inserts, so the lock is only held for the
/// duration of a single map operation.
pub struct MembershipCache {
    entries: Mutex<LruCache<String, ()>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MembershipCache {
    /// Creates a new cache with the specified capacity. Zero is clamped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a new cache with the default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    /// Maximum number of URLs kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> MembershipStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        MembershipStats {
            hits,
            misses,
            hit_rate,
            size: self.len(),
            capacity: self.capacity(),
        }
    }
}

impl Default for MembershipCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl std::fmt::Debug for MembershipCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// Statistics about cache effectiveness.
#[derive(Debug, Clone)]
pub struct MembershipStats {
    /// Number of `has` calls that found the URL.
    pub hits: u64,
    /// Number of `has` calls that did not.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of recorded URLs.
    pub size: usize,
    /// Configured capacity.
    pub capacity: usize,
}

impl std::fmt::Display for MembershipStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {}/{} urls, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.capacity, self.hit_rate, self.hits, self.misses
        )
    }
}

impl MembershipCachePort for MembershipCache {
    fn has(&self, url: &str) -> bool {
        let found = self.entries.lock().contains(url);
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(url = %url, "Membership cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(url = %url, "Membership cache miss");
        }
        found
    }

    fn add(&self, url: &str) {
        let mut entries = self.entries.lock();
        if entries.get(url).is_some() {
            return;
        }
        if let Some((evicted, ())) = entries.push(url.to_string(), ()) {
            if evicted != url {
                debug!(url = %evicted, "Evicted url from membership cache");
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_has() {
        let cache = MembershipCache::new(10);
        assert!(!cache.has("a.jpg"));

        cache.add("a.jpg");

        assert!(cache.has("a.jpg"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_add_is_idempotent() {
        let cache = MembershipCache::new(10);
        cache.add("a.jpg");
        cache.add("a.jpg");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_is_lru() {
        let cache = MembershipCache::new(2);

        cache.add("1.jpg");
        cache.add("2.jpg");
        cache.add("3.jpg");

        // 1.jpg should be evicted (LRU)
        assert!(!cache.has("1.jpg"));
        assert!(cache.has("2.jpg"));
        assert!(cache.has("3.jpg"));
    }

    #[test]
    fn test_re_add_promotes() {
        let cache = MembershipCache::new(2);

        cache.add("1.jpg");
        cache.add("2.jpg");
        cache.add("1.jpg");
        cache.add("3.jpg");

        assert!(cache.has("1.jpg"));
        assert!(!cache.has("2.jpg"));
    }

    #[test]
    fn test_has_does_not_promote() {
        let cache = MembershipCache::new(2);

        cache.add("1.jpg");
        cache.add("2.jpg");
        assert!(cache.has("1.jpg"));
        cache.add("3.jpg");

        assert!(!cache.has("1.jpg"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = MembershipCache::new(0);
        cache.add("1.jpg");
        cache.add("2.jpg");
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.has("2.jpg"));
    }

    #[test]
    fn test_stats() {
        let cache = MembershipCache::new(10);
        cache.add("a.jpg");

        assert!(cache.has("a.jpg"));
        assert!(!cache.has("missing.jpg"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 10);
        assert!(stats.to_string().contains("50.0% hit rate"));
    }
}
