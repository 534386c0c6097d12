//! The composed key-value engine
//!
//! One [`Engine`] owns a skip list plus three optional tiers: a membership
//! filter, a hot cache and an expiration policy. Every operation takes the
//! same exclusive lock over all four, so the tiers are always mutated in
//! lockstep. Reads take it too: a cache hit reorders the cache.

use crate::config::{EngineConfig, NodeStorage};
use rand::RngCore;
use skiplite_core::{
    Clock, Error, ExpirationPolicy, Expiry, HotCache, InsertOutcome, MembershipFilter, Result,
    StoreKey, StoreValue, SystemClock, Ttl,
};
use skiplite_snapshot::{dump_snapshot, load_snapshot, LoadStats, SnapshotConfig, SnapshotMeta};
use skiplite_storage::{
    AcceptAll, ArenaNodes, BloomFilter, HeapNodes, LruCache, MemoryGauge, NeverExpire, NoCache,
    NodeStore, ParkMiller, SkipList, TtlMap,
};
use std::sync::{Arc, Mutex, MutexGuard};

type DynNodes<K, V> = Box<dyn NodeStore<K, V> + Send>;
type DynRng = Box<dyn RngCore + Send>;

/// Point-in-time counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// Keys in the skip list, including expired ones not yet purged
    pub len: usize,
    /// Highest populated level
    pub cur_level: usize,
    /// Level ceiling
    pub max_level: usize,
    /// Entries in the hot cache
    pub cache_len: usize,
    /// Keys with a TTL
    pub tracked_ttls: usize,
    /// Bits set in the membership filter
    pub filter_bits_set: usize,
    /// Bytes held by node storage
    pub memory_usage: usize,
}

struct EngineState<K, V> {
    list: SkipList<K, V, DynNodes<K, V>, DynRng>,
    filter: Box<dyn MembershipFilter<K>>,
    cache: Box<dyn HotCache<K, V>>,
    expirations: Box<dyn ExpirationPolicy<K>>,
}

impl<K: StoreKey, V: StoreValue> EngineState<K, V> {
    /// Removes a key from every tier. Returns true if the list held it.
    fn purge(&mut self, key: &K) -> bool {
        self.cache.remove(key);
        self.expirations.remove(key);
        self.list.delete(key)
    }

    fn purge_if_expired(&mut self, key: &K) -> bool {
        if self.expirations.status(key) != Expiry::Expired {
            return false;
        }
        self.purge(key);
        tracing::debug!(key = %key, "expired key purged");
        true
    }

    fn insert(&mut self, key: K, value: V) -> Result<InsertOutcome> {
        self.purge_if_expired(&key);
        self.filter.insert(&key);
        let outcome = if self.cache.capacity() > 0 {
            let outcome = self.list.insert(key.clone(), value.clone())?;
            self.cache.put(key, value);
            outcome
        } else {
            self.list.insert(key, value)?
        };
        Ok(outcome)
    }

    fn search(&mut self, key: &K) -> Option<V> {
        if !self.filter.may_contain(key) {
            tracing::trace!(key = %key, "filter rejected");
            return None;
        }
        if self.purge_if_expired(key) {
            return None;
        }
        if let Some(value) = self.cache.get(key) {
            tracing::trace!(key = %key, "cache hit");
            return Some(value.clone());
        }
        let value = self.list.search(key)?.clone();
        tracing::trace!(key = %key, "list hit");
        self.cache.put(key.clone(), value.clone());
        Some(value)
    }

    fn delete(&mut self, key: &K) -> bool {
        if !self.filter.may_contain(key) {
            return false;
        }
        if self.purge_if_expired(key) {
            return false;
        }
        self.purge(key)
    }

    fn ttl(&mut self, key: &K) -> Ttl {
        match self.expirations.status(key) {
            Expiry::Expired => {
                self.purge(key);
                Ttl::NotFound
            }
            Expiry::Alive => Ttl::Remaining(self.expirations.remaining(key).unwrap_or(0)),
            Expiry::Unknown if self.list.contains(key) => Ttl::Permanent,
            Expiry::Unknown => Ttl::NotFound,
        }
    }

    fn cycle_delete(&mut self, sample_size: usize) -> usize {
        let mut purged = 0;
        loop {
            let sample = self.expirations.sample(sample_size);
            if sample.is_empty() {
                break;
            }
            let mut expired = 0;
            for key in &sample {
                if self.expirations.status(key) == Expiry::Expired {
                    self.purge(key);
                    tracing::debug!(key = %key, "cycle delete");
                    expired += 1;
                }
            }
            purged += expired;
            if expired * 2 <= sample.len() {
                break;
            }
        }
        purged
    }

    fn live_entries(&self) -> Vec<(K, V)> {
        self.list
            .iter()
            .filter(|(k, _)| self.expirations.status(k) != Expiry::Expired)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

struct Shared<K, V> {
    state: Mutex<EngineState<K, V>>,
    gauge: MemoryGauge,
    config: EngineConfig,
}

/// The key-value store handle.
///
/// Cloning is cheap and every clone refers to the same store, so a handle
/// can be moved into each worker thread.
///
/// # Examples
///
/// ```rust
/// use skiplite::{Engine, InsertOutcome};
///
/// let engine: Engine<u32, String> = Engine::new()?;
/// assert_eq!(engine.insert(1, "sing".to_string())?, InsertOutcome::Inserted);
/// assert_eq!(engine.search(&1)?, Some("sing".to_string()));
/// assert!(engine.delete(&1)?);
/// # Ok::<(), skiplite::Error>(())
/// ```
pub struct Engine<K, V> {
    inner: Arc<Shared<K, V>>,
}

impl<K, V> Clone for Engine<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: StoreKey, V: StoreValue> Engine<K, V> {
    /// Creates an engine with the default configuration
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Creates an engine with a custom configuration
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Starts a builder for injecting custom tiers, clock or random source
    pub fn builder() -> EngineBuilder<K, V> {
        EngineBuilder::new()
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineState<K, V>>> {
        self.inner.state.lock().map_err(|_| Error::LockPoisoned)
    }

    /// The configuration this engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Inserts a key, or overwrites an existing one.
    ///
    /// A key that had expired comes back permanent; an updated key keeps a
    /// TTL that has not yet elapsed.
    pub fn insert(&self, key: K, value: V) -> Result<InsertOutcome> {
        let mut state = self.lock()?;
        tracing::debug!(key = %key, "insert");
        state.insert(key, value)
    }

    /// Looks up a key. Expired keys are purged and reported absent.
    pub fn search(&self, key: &K) -> Result<Option<V>> {
        Ok(self.lock()?.search(key))
    }

    /// Removes a key. Returns false if it was absent or had expired.
    pub fn delete(&self, key: &K) -> Result<bool> {
        let removed = self.lock()?.delete(key);
        tracing::debug!(key = %key, removed, "delete");
        Ok(removed)
    }

    /// Gives an existing key a lifetime of `seconds` from now.
    ///
    /// Returns false if the key is absent, or if expiration is disabled.
    pub fn set_ttl(&self, key: &K, seconds: u64) -> Result<bool> {
        let mut state = self.lock()?;
        if state.search(key).is_none() {
            tracing::debug!(key = %key, "ttl not set, key not found");
            return Ok(false);
        }
        let set = state.expirations.set_ttl(key.clone(), seconds);
        tracing::debug!(key = %key, seconds, set, "set ttl");
        Ok(set)
    }

    /// Remaining lifetime of a key
    pub fn ttl(&self, key: &K) -> Result<Ttl> {
        Ok(self.lock()?.ttl(key))
    }

    /// Expiration status without purging anything
    pub fn expiry(&self, key: &K) -> Result<Expiry> {
        Ok(self.lock()?.expirations.status(key))
    }

    /// Number of keys held, including expired keys not yet purged
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.list.len())
    }

    /// Returns true if no keys are held
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Sweeps sampled TTL keys, repeating while more than half of a round
    /// had expired. Returns the number of keys purged.
    pub fn cycle_delete(&self) -> Result<usize> {
        let sample_size = self.inner.config.sweep_sample_size;
        let purged = self.lock()?.cycle_delete(sample_size);
        if purged > 0 {
            tracing::info!(purged, "cycle delete finished");
        }
        Ok(purged)
    }

    /// Live entries in ascending key order
    pub fn entries(&self) -> Result<Vec<(K, V)>> {
        Ok(self.lock()?.live_entries())
    }

    /// Keys at every level, from the highest populated level down to 0
    pub fn levels(&self) -> Result<Vec<Vec<K>>> {
        let state = self.lock()?;
        Ok((0..=state.list.cur_level())
            .rev()
            .map(|level| state.list.level_keys(level).into_iter().cloned().collect())
            .collect())
    }

    /// Returns true if the key sits in the hot cache. Does not touch recency.
    pub fn is_cached(&self, key: &K) -> Result<bool> {
        Ok(self.lock()?.cache.contains(key))
    }

    /// Bytes held by node storage, read without taking the engine lock
    pub fn memory_usage(&self) -> usize {
        self.inner.gauge.get()
    }

    /// Point-in-time counters
    pub fn stats(&self) -> Result<EngineStats> {
        let state = self.lock()?;
        Ok(EngineStats {
            len: state.list.len(),
            cur_level: state.list.cur_level(),
            max_level: state.list.max_level(),
            cache_len: state.cache.len(),
            tracked_ttls: state.expirations.len(),
            filter_bits_set: state.filter.bits_set(),
            memory_usage: self.inner.gauge.get(),
        })
    }

    /// Writes live entries to the configured snapshot
    pub fn dump(&self) -> Result<SnapshotMeta> {
        self.dump_to(&self.inner.config.snapshot)
    }

    /// Writes live entries to the given snapshot.
    ///
    /// Entries are copied under the lock and written after it is released.
    pub fn dump_to(&self, snapshot: &SnapshotConfig) -> Result<SnapshotMeta> {
        let entries = self.entries()?;
        dump_snapshot(snapshot, entries)
    }

    /// Applies the configured snapshot through the normal insert path
    pub fn load(&self) -> Result<LoadStats> {
        self.load_from(&self.inner.config.snapshot)
    }

    /// Applies the given snapshot through the normal insert path.
    ///
    /// Lines whose key or value do not parse are counted as skipped.
    pub fn load_from(&self, snapshot: &SnapshotConfig) -> Result<LoadStats> {
        let mut state = self.lock()?;
        load_snapshot(snapshot, |key, value| {
            let (key, value) = match (key.parse::<K>(), value.parse::<V>()) {
                (Ok(k), Ok(v)) => (k, v),
                _ => return Ok(false),
            };
            state.insert(key, value)?;
            Ok(true)
        })
    }
}

/// Builder for an [`Engine`] with injected capabilities.
///
/// Anything not injected is derived from the [`EngineConfig`].
///
/// ```rust
/// use skiplite::{Engine, EngineConfig, ManualClock, NoCache};
/// use std::sync::Arc;
///
/// let clock = ManualClock::new(0);
/// let engine: Engine<String, String> = Engine::builder()
///     .config(EngineConfig::default().with_max_level(6))
///     .clock(Arc::new(clock.clone()))
///     .cache(Box::new(NoCache))
///     .build()?;
/// # Ok::<(), skiplite::Error>(())
/// ```
pub struct EngineBuilder<K, V> {
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    rng: Option<DynRng>,
    filter: Option<Box<dyn MembershipFilter<K>>>,
    cache: Option<Box<dyn HotCache<K, V>>>,
    expirations: Option<Box<dyn ExpirationPolicy<K>>>,
}

impl<K: StoreKey, V: StoreValue> EngineBuilder<K, V> {
    /// Starts from the default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            clock: None,
            rng: None,
            filter: None,
            cache: None,
            expirations: None,
        }
    }

    /// Replaces the configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock used by the default TTL map
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Random source for level draws
    pub fn rng(mut self, rng: Box<dyn RngCore + Send>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Membership filter tier
    pub fn filter(mut self, filter: Box<dyn MembershipFilter<K>>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Hot cache tier
    pub fn cache(mut self, cache: Box<dyn HotCache<K, V>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Expiration policy tier
    pub fn expiration(mut self, policy: Box<dyn ExpirationPolicy<K>>) -> Self {
        self.expirations = Some(policy);
        self
    }

    /// Validates the configuration and assembles the engine
    pub fn build(self) -> Result<Engine<K, V>> {
        let config = self.config;
        config.validate()?;

        let store: DynNodes<K, V> = match config.node_storage {
            NodeStorage::Heap => Box::new(HeapNodes::new()),
            NodeStorage::Arena => Box::new(ArenaNodes::new()),
        };
        let gauge = store.gauge();
        let rng: DynRng = match self.rng {
            Some(rng) => rng,
            None => Box::new(ParkMiller::new(config.seed)),
        };
        let filter: Box<dyn MembershipFilter<K>> = match (self.filter, config.bloom_bits) {
            (Some(filter), _) => filter,
            (None, Some(bits)) => Box::new(BloomFilter::new(bits)),
            (None, None) => Box::new(AcceptAll),
        };
        let cache: Box<dyn HotCache<K, V>> = match self.cache {
            Some(cache) => cache,
            None if config.lru_capacity == 0 => Box::new(NoCache),
            None => Box::new(LruCache::new(config.lru_capacity)),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let expirations: Box<dyn ExpirationPolicy<K>> = match self.expirations {
            Some(policy) => policy,
            None if config.expiration => {
                Box::new(TtlMap::with_clock(clock).with_seed(config.seed))
            }
            None => Box::new(NeverExpire),
        };

        tracing::info!(
            max_level = config.max_level,
            storage = ?config.node_storage,
            bloom_bits = ?config.bloom_bits,
            lru_capacity = config.lru_capacity,
            expiration = config.expiration,
            "engine created"
        );

        let state = EngineState {
            list: SkipList::with_parts(config.max_level, store, rng),
            filter,
            cache,
            expirations,
        };
        Ok(Engine {
            inner: Arc::new(Shared {
                state: Mutex::new(state),
                gauge,
                config,
            }),
        })
    }
}

impl<K: StoreKey, V: StoreValue> Default for EngineBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
