// Common test utilities for engine integration tests

use skiplite::{Engine, EngineConfig, ManualClock, SnapshotConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Test fixture with a temporary snapshot location and a manual clock
pub struct EngineTestFixture {
    #[allow(dead_code)]
    pub temp_dir: TempDir,
    pub snapshot_path: PathBuf,
    pub clock: ManualClock,
}

impl EngineTestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let snapshot_path = temp_dir.path().join("store").join("dumpFile.txt");
        Self {
            temp_dir,
            snapshot_path,
            clock: ManualClock::new(1_000),
        }
    }

    #[allow(dead_code)]
    pub fn config(&self) -> EngineConfig {
        EngineConfig::default().with_snapshot(SnapshotConfig::at(&self.snapshot_path))
    }

    /// Engine on this fixture's snapshot path and clock
    pub fn engine<K, V>(&self) -> Engine<K, V>
    where
        K: skiplite::StoreKey,
        V: skiplite::StoreValue,
    {
        self.engine_with(self.config())
    }

    #[allow(dead_code)]
    pub fn engine_with<K, V>(&self, config: EngineConfig) -> Engine<K, V>
    where
        K: skiplite::StoreKey,
        V: skiplite::StoreValue,
    {
        Engine::builder()
            .config(config)
            .clock(Arc::new(self.clock.clone()))
            .build()
            .expect("Failed to build engine")
    }
}

impl Default for EngineTestFixture {
    fn default() -> Self {
        Self::new()
    }
}
