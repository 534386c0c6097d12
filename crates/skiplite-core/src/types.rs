//! Outcome types shared by every tier of the store.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// Result of inserting a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
    /// A new node was spliced into the list
    Inserted,
    /// The key already existed and its value was overwritten in place
    Updated,
}

/// Expiration status of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiry {
    /// No TTL is tracked for the key (permanent or absent)
    Unknown,
    /// The TTL has elapsed; the key must be treated as absent
    Expired,
    /// A TTL is tracked and has not elapsed yet
    Alive,
}

/// Remaining lifetime of a key as reported by `ttl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ttl {
    /// Seconds left before the key expires
    Remaining(u64),
    /// The key exists and has no TTL
    Permanent,
    /// The key does not exist (or has just expired)
    NotFound,
}

/// Bounds required of keys stored in the engine.
///
/// Ordering comes from `Ord`, membership hashing from `Hash`, and the
/// snapshot text form from `Display`/`FromStr`.
pub trait StoreKey: Ord + Hash + Clone + Display + FromStr + Send + 'static {}

impl<T> StoreKey for T where T: Ord + Hash + Clone + Display + FromStr + Send + 'static {}

/// Bounds required of values stored in the engine.
pub trait StoreValue: Clone + Display + FromStr + Send + 'static {}

impl<T> StoreValue for T where T: Clone + Display + FromStr + Send + 'static {}
