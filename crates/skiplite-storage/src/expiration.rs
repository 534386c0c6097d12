//! TTL bookkeeping
//!
//! A key is tracked from the moment a TTL is set on it and counts as expired
//! once `now - set_at >= ttl`. Untracked keys are permanent. The map only
//! answers questions; removing expired keys from the store is the engine's
//! job, lazily on access or in sampled sweep rounds.

use crate::random::ParkMiller;
use rand::seq::IteratorRandom;
use skiplite_core::{Clock, ExpirationPolicy, Expiry, SystemClock};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Keys examined per active sweep round when none is configured
pub const DEFAULT_SWEEP_SAMPLE: usize = 20;

#[derive(Debug, Clone, Copy)]
struct Deadline {
    ttl: u64,
    set_at: u64,
}

/// Clock-driven map from key to `(ttl, set_at)`
pub struct TtlMap<K> {
    entries: HashMap<K, Deadline>,
    clock: Arc<dyn Clock>,
    rng: ParkMiller,
}

impl<K: Hash + Eq + Clone> TtlMap<K> {
    /// Creates a map reading the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a map reading the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
            rng: ParkMiller::default(),
        }
    }

    /// Seeds the generator that picks sweep samples
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.rng = ParkMiller::new(seed);
        self
    }

    fn elapsed(&self, deadline: &Deadline) -> u64 {
        self.clock.now_secs().saturating_sub(deadline.set_at)
    }
}

impl<K: Hash + Eq + Clone> Default for TtlMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone + Send> ExpirationPolicy<K> for TtlMap<K> {
    fn set_ttl(&mut self, key: K, seconds: u64) -> bool {
        let set_at = self.clock.now_secs();
        self.entries.insert(key, Deadline { ttl: seconds, set_at });
        true
    }

    fn status(&self, key: &K) -> Expiry {
        match self.entries.get(key) {
            None => Expiry::Unknown,
            Some(d) if self.elapsed(d) >= d.ttl => Expiry::Expired,
            Some(_) => Expiry::Alive,
        }
    }

    fn remaining(&self, key: &K) -> Option<u64> {
        self.entries
            .get(key)
            .map(|d| d.ttl.saturating_sub(self.elapsed(d)))
    }

    fn remove(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    fn sample(&mut self, n: usize) -> Vec<K> {
        self.entries
            .keys()
            .choose_multiple(&mut self.rng, n)
            .into_iter()
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Policy used when expiration is disabled. Every key is permanent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverExpire;

impl<K> ExpirationPolicy<K> for NeverExpire {
    fn set_ttl(&mut self, _key: K, _seconds: u64) -> bool {
        false
    }

    fn status(&self, _key: &K) -> Expiry {
        Expiry::Unknown
    }

    fn remaining(&self, _key: &K) -> Option<u64> {
        None
    }

    fn remove(&mut self, _key: &K) -> bool {
        false
    }

    fn sample(&mut self, _n: usize) -> Vec<K> {
        Vec::new()
    }

    fn len(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiplite_core::ManualClock;

    fn map_at(start: u64) -> (TtlMap<String>, ManualClock) {
        let clock = ManualClock::new(start);
        (TtlMap::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_untracked_is_unknown() {
        let (map, _) = map_at(0);
        assert_eq!(map.status(&"k".to_string()), Expiry::Unknown);
        assert_eq!(map.remaining(&"k".to_string()), None);
    }

    #[test]
    fn test_expires_at_boundary() {
        let (mut map, clock) = map_at(1_000);
        let key = "session".to_string();
        assert!(map.set_ttl(key.clone(), 10));

        clock.advance(9);
        assert_eq!(map.status(&key), Expiry::Alive);
        assert_eq!(map.remaining(&key), Some(1));

        clock.advance(1);
        assert_eq!(map.status(&key), Expiry::Expired);
        assert_eq!(map.remaining(&key), Some(0));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let (mut map, _) = map_at(5);
        map.set_ttl("k".to_string(), 0);
        assert_eq!(map.status(&"k".to_string()), Expiry::Expired);
    }

    #[test]
    fn test_clock_going_backwards_saturates() {
        let (mut map, clock) = map_at(100);
        map.set_ttl("k".to_string(), 5);
        clock.set(50);
        assert_eq!(map.status(&"k".to_string()), Expiry::Alive);
        assert_eq!(map.remaining(&"k".to_string()), Some(5));
    }

    #[test]
    fn test_reset_ttl_restarts_countdown() {
        let (mut map, clock) = map_at(0);
        let key = "k".to_string();
        map.set_ttl(key.clone(), 10);
        clock.advance(8);
        map.set_ttl(key.clone(), 10);
        clock.advance(8);
        assert_eq!(map.status(&key), Expiry::Alive);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove() {
        let (mut map, _) = map_at(0);
        map.set_ttl("k".to_string(), 10);
        assert!(map.remove(&"k".to_string()));
        assert!(!map.remove(&"k".to_string()));
        assert!(map.is_empty());
    }

    #[test]
    fn test_sample_is_bounded_and_distinct() {
        let (mut map, _) = map_at(0);
        for i in 0..50 {
            map.set_ttl(format!("k{}", i), 1);
        }
        let mut picked = map.sample(20);
        assert_eq!(picked.len(), 20);
        picked.sort();
        picked.dedup();
        assert_eq!(picked.len(), 20);

        assert_eq!(map.sample(100).len(), 50);
    }

    #[test]
    fn test_sample_spreads_over_all_keys() {
        let (mut map, _) = map_at(0);
        for i in 0..20 {
            map.set_ttl(format!("k{}", i), 1);
        }
        let mut hits: HashMap<String, usize> = HashMap::new();
        for _ in 0..2_000 {
            for key in map.sample(1) {
                *hits.entry(key).or_default() += 1;
            }
        }
        // Each key expects about 100 picks
        assert_eq!(hits.len(), 20);
        assert!(hits.values().all(|&n| n >= 30), "skewed sample: {:?}", hits);
    }

    #[test]
    fn test_never_expire() {
        let mut policy = NeverExpire;
        assert!(!ExpirationPolicy::<u32>::set_ttl(&mut policy, 1, 10));
        assert_eq!(ExpirationPolicy::<u32>::status(&policy, &1), Expiry::Unknown);
        assert!(ExpirationPolicy::<u32>::sample(&mut policy, 5).is_empty());
    }
}
