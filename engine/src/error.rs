//! Error types for the Stash engine.

use thiserror::Error;

/// All possible errors from the Stash engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid task status: {0}")]
    InvalidStatus(String),

    #[error("invalid queue snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
