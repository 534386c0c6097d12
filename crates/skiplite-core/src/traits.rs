//! Capability traits composed by the engine.
//!
//! The skip list is the source of truth. Each capability below is an
//! optional tier around it and is injected as a strategy object, so a
//! store can run with or without a membership filter, a hot cache, or
//! expiration tracking.

use crate::types::Expiry;

/// Fast "definitely absent" test in front of the skip list.
///
/// Implementations must never report a false negative for a key that was
/// inserted. False positives are allowed.
pub trait MembershipFilter<K>: Send {
    /// Record the key as possibly present
    fn insert(&mut self, key: &K);

    /// Returns `false` only if the key was never inserted
    fn may_contain(&self, key: &K) -> bool;

    /// Number of bits currently set (0 for filters without a bit array)
    fn bits_set(&self) -> usize {
        0
    }
}

/// Bounded hot-key tier. Pure acceleration, never authoritative.
pub trait HotCache<K, V>: Send {
    /// Look up a key, marking it most recently used on a hit
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Insert or overwrite a key as most recently used, evicting if full
    fn put(&mut self, key: K, value: V);

    /// Drop a key, returning its cached value
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Membership probe that does not touch recency
    fn contains(&self, key: &K) -> bool;

    /// Number of cached entries
    fn len(&self) -> usize;

    /// Returns true if nothing is cached
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached entries
    fn capacity(&self) -> usize;
}

/// Per-key time-to-live bookkeeping.
pub trait ExpirationPolicy<K>: Send {
    /// Start tracking a TTL of `seconds` from now. Returns false if the
    /// policy does not support expiration.
    fn set_ttl(&mut self, key: K, seconds: u64) -> bool;

    /// Expiration status of a key
    fn status(&self, key: &K) -> Expiry;

    /// Seconds left for a tracked key, `None` if untracked
    fn remaining(&self, key: &K) -> Option<u64>;

    /// Stop tracking a key. Returns true if it was tracked.
    fn remove(&mut self, key: &K) -> bool;

    /// Pick up to `n` tracked keys for an active sweep round
    fn sample(&mut self, n: usize) -> Vec<K>;

    /// Number of tracked keys
    fn len(&self) -> usize;

    /// Returns true if no key is tracked
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
