//! # SkipLite Storage
//!
//! In-memory building blocks for SkipLite.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of SkipLite.**
//!
//! Users should depend on the main `skiplite` crate instead, which provides
//! the stable public API. This crate's API may change without notice between
//! minor versions.
//!
//! ---
//!
//! - **SkipList**: ordered map with randomized levels over a pluggable node store
//! - **Arena**: bump allocator backing [`ArenaNodes`]
//! - **BloomFilter**: five-hash "definitely absent" guard
//! - **LruCache**: bounded hot-key tier
//! - **TtlMap**: per-key expiration bookkeeping
//!
//! ## Read path
//!
//! ```text
//! search(k) → BloomFilter ─no─► miss
//!                 │ maybe
//!                 ▼
//!             TtlMap ─expired─► purge, miss
//!                 │
//!                 ▼
//!             LruCache ─hit─► value
//!                 │ miss
//!                 ▼
//!             SkipList ─found─► populate cache, value
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arena;
pub mod bloom;
pub mod expiration;
pub mod lru;
pub mod node;
pub mod random;
pub mod skiplist;

pub use arena::{Arena, ArenaSlice, MemoryGauge, BLOCK_SIZE};
pub use bloom::{AcceptAll, BitMap, BloomFilter, DEFAULT_BLOOM_BITS};
pub use expiration::{NeverExpire, TtlMap, DEFAULT_SWEEP_SAMPLE};
pub use lru::{LruCache, NoCache, DEFAULT_LRU_CAPACITY};
pub use node::{ArenaNodes, HeapNodes, NodeId, NodeStore};
pub use random::{ParkMiller, DEFAULT_SEED};
pub use skiplist::{SkipList, DEFAULT_MAX_LEVEL};
