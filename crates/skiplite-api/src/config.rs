//! Engine configuration

use serde::{Deserialize, Serialize};
use skiplite_core::{Error, Result};
use skiplite_snapshot::SnapshotConfig;
use skiplite_storage::{
    DEFAULT_BLOOM_BITS, DEFAULT_LRU_CAPACITY, DEFAULT_MAX_LEVEL, DEFAULT_SEED,
    DEFAULT_SWEEP_SAMPLE,
};
use std::time::Duration;

/// Highest accepted `max_level`
pub const MAX_LEVEL_LIMIT: usize = 32;

/// Where skip-list nodes live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeStorage {
    /// Individually owned nodes, freed on delete
    #[default]
    Heap,
    /// Forward links bump-allocated from an arena, never freed before drop
    Arena,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Level ceiling for the skip list
    pub max_level: usize,
    /// Node storage backend
    pub node_storage: NodeStorage,
    /// Bloom filter size in bits, `None` disables the filter
    pub bloom_bits: Option<usize>,
    /// Hot cache capacity, 0 disables the cache
    pub lru_capacity: usize,
    /// Track per-key TTLs
    pub expiration: bool,
    /// Keys examined per active sweep round
    pub sweep_sample_size: usize,
    /// Seed for level draws and sweep sampling
    pub seed: u32,
    /// Snapshot location and checks
    pub snapshot: SnapshotConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            node_storage: NodeStorage::Heap,
            bloom_bits: Some(DEFAULT_BLOOM_BITS),
            lru_capacity: DEFAULT_LRU_CAPACITY,
            expiration: true,
            sweep_sample_size: DEFAULT_SWEEP_SAMPLE,
            seed: DEFAULT_SEED,
            snapshot: SnapshotConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Rejects values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_level == 0 || self.max_level > MAX_LEVEL_LIMIT {
            return Err(Error::InvalidConfig(format!(
                "max_level must be in 1..={}, got {}",
                MAX_LEVEL_LIMIT, self.max_level
            )));
        }
        if self.bloom_bits == Some(0) {
            return Err(Error::InvalidConfig(
                "bloom_bits must be non-zero; use None to disable the filter".into(),
            ));
        }
        if self.sweep_sample_size == 0 {
            return Err(Error::InvalidConfig(
                "sweep_sample_size must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Sets the level ceiling
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    /// Sets the node storage backend
    pub fn with_node_storage(mut self, storage: NodeStorage) -> Self {
        self.node_storage = storage;
        self
    }

    /// Sets the Bloom filter size, `None` to disable it
    pub fn with_bloom_bits(mut self, bits: Option<usize>) -> Self {
        self.bloom_bits = bits;
        self
    }

    /// Sets the hot cache capacity
    pub fn with_lru_capacity(mut self, capacity: usize) -> Self {
        self.lru_capacity = capacity;
        self
    }

    /// Turns TTL tracking on or off
    pub fn with_expiration(mut self, enabled: bool) -> Self {
        self.expiration = enabled;
        self
    }

    /// Sets the random seed
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the snapshot configuration
    pub fn with_snapshot(mut self, snapshot: SnapshotConfig) -> Self {
        self.snapshot = snapshot;
        self
    }
}

/// Background maintenance settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Time between sweep ticks
    pub interval: Duration,
    /// Also dump a snapshot on every tick
    pub dump: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            dump: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_level, 12);
        assert_eq!(config.bloom_bits, Some(500_000));
        assert_eq!(config.lru_capacity, 8);
        assert_eq!(config.sweep_sample_size, 20);
        assert_eq!(config.seed, 0xdead_beef);
        assert!(config.expiration);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            EngineConfig::default().with_max_level(0),
            EngineConfig::default().with_max_level(MAX_LEVEL_LIMIT + 1),
            EngineConfig::default().with_bloom_bits(Some(0)),
            EngineConfig {
                sweep_sample_size: 0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
        assert!(EngineConfig::default()
            .with_bloom_bits(None)
            .with_lru_capacity(0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = EngineConfig::default()
            .with_node_storage(NodeStorage::Arena)
            .with_seed(7);
        let encoded = bincode::serialize(&config).unwrap();
        let decoded: EngineConfig = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded, config);
    }
}
