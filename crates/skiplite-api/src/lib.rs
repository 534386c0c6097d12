//! # SkipLite
//!
//! An in-memory key-value store built on a probabilistic skip list, with a
//! Bloom filter in front of lookups, an LRU hot-key cache, per-key TTLs and
//! whole-dataset snapshots.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skiplite::{Engine, EngineConfig, SnapshotConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let snapshot = SnapshotConfig::at("store/dumpFile.txt");
//!     let config = EngineConfig::default().with_snapshot(snapshot);
//!     let engine: Engine<u32, String> = Engine::with_config(config)?;
//!
//!     engine.insert(1, "sing".to_string())?;
//!     engine.insert(2, "dance".to_string())?;
//!     engine.set_ttl(&2, 30)?;
//!
//!     if let Some(value) = engine.search(&1)? {
//!         println!("1 => {}", value);
//!     }
//!
//!     engine.dump()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Tiers
//!
//! - **Bloom filter**: rejects keys that were never inserted without touching the list
//! - **LRU cache**: answers hot keys without a traversal
//! - **TTL map**: expired keys are purged lazily on access and by [`Engine::cycle_delete`]
//! - **Skip list**: the source of truth, heap or arena backed
//!
//! Each tier can be disabled through [`EngineConfig`] or replaced through
//! [`Engine::builder`].
//!
//! ## Background maintenance
//!
//! ```rust,no_run
//! use skiplite::{Engine, SweepConfig, Sweeper};
//! use std::time::Duration;
//!
//! let engine: Engine<String, String> = Engine::new()?;
//! let sweeper = Sweeper::spawn(
//!     engine.clone(),
//!     SweepConfig { interval: Duration::from_secs(5), dump: true },
//! )?;
//! // ...
//! sweeper.stop();
//! # Ok::<(), skiplite::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod logging;
pub mod sweeper;

pub use config::{EngineConfig, NodeStorage, SweepConfig, MAX_LEVEL_LIMIT};
pub use engine::{Engine, EngineBuilder, EngineStats};
pub use sweeper::Sweeper;

// Re-export core types
pub use skiplite_core::{
    Clock, Error, ExpirationPolicy, Expiry, HotCache, InsertOutcome, ManualClock,
    MembershipFilter, Result, StoreKey, StoreValue, SystemClock, Ttl,
};

// Tier implementations
pub use skiplite_storage::{
    AcceptAll, BloomFilter, LruCache, NeverExpire, NoCache, ParkMiller, TtlMap,
};

// Snapshot components
pub use skiplite_snapshot::{
    parse_line, LoadStats, SnapshotConfig, SnapshotLineError, SnapshotMeta, DELIMITER,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
