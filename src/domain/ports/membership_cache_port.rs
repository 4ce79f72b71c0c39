//! Port definition for the shared "known good" URL record.

/// Bounded record of URLs that have already been fetched successfully.
///
/// Membership only: there are no values and no removal besides eviction.
/// Calls are synchronous because the answer decides the very first render.
pub trait MembershipCachePort: Send + Sync {
    /// Returns true if `url` is recorded. Does not touch recency.
    fn has(&self, url: &str) -> bool;

    /// Records `url` as most recently used, evicting the oldest entry when full.
    fn add(&self, url: &str);

    /// Returns the number of recorded URLs.
    fn len(&self) -> usize;

    /// Returns true if nothing is recorded.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
