//! Unified error handling for the client.

use stash_engine::TaskId;
use thiserror::Error;

/// Client error type.
///
/// A `Remote` error on an explicit online mutation always surfaces to the
/// caller; it is never converted into a queued offline operation. A
/// `Storage` error on queue append likewise surfaces; the caller must not
/// assume the mutation was durably queued.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("remote store error: {0}")]
    Remote(String),

    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("engine error: {0}")]
    Engine(#[from] stash_engine::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Remote(e.to_string())
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
