//! Outbox error types.

use thiserror::Error;

/// Outbox error type.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] tracker_storage::StorageError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hit URL could not be built for an event
    #[error("Invalid hit URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;
