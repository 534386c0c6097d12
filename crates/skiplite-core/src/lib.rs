//! # SkipLite Core
//!
//! Core types and traits shared by the SkipLite crates.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of SkipLite.**
//!
//! Users should depend on the main `skiplite` crate instead, which provides
//! the stable public API. This crate's API may change without notice between
//! minor versions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod error;
pub mod format_version;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use traits::{ExpirationPolicy, HotCache, MembershipFilter};
pub use types::{Expiry, InsertOutcome, StoreKey, StoreValue, Ttl};
