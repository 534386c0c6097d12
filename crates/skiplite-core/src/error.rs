//! Error types for SkipLite.
//!
//! Expected negative outcomes (a missing key, an expired key, a malformed
//! snapshot line) are returned as plain values by the engine. Only the
//! conditions below surface as errors.

use std::fmt;

/// The main error type for SkipLite operations.
#[derive(Debug)]
pub enum Error {
    /// A lock was poisoned (internal error)
    LockPoisoned,

    /// I/O error
    Io(std::io::Error),

    /// Serialization/deserialization error
    Serialization(String),

    /// On-disk data failed validation
    Corruption(String),

    /// The node arena could not grow
    AllocationFailure {
        /// Number of bytes the failed block reservation asked for
        requested: usize,
    },

    /// Rejected configuration value
    InvalidConfig(String),

    /// Invalid operation
    InvalidOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LockPoisoned => write!(f, "Lock poisoned"),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Corruption(msg) => write!(f, "Corruption: {}", msg),
            Error::AllocationFailure { requested } => {
                write!(f, "Allocation failure: could not reserve {} bytes", requested)
            }
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// A specialized `Result` type for SkipLite operations.
pub type Result<T> = std::result::Result<T, Error>;
