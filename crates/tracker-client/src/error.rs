//! Tracker error types.

use thiserror::Error;

/// Tracker error type.
///
/// Configuration and validation errors surface synchronously to the
/// caller; delivery failures never do (the queue absorbs them).
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A trigger was called before initialize
    #[error("Tracker is not initialized")]
    NotInitialized,

    /// Initialize was called twice
    #[error("Tracker is already initialized")]
    AlreadyInitialized,

    /// Required configuration value missing or empty
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Required event field missing or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Queue error
    #[error(transparent)]
    Outbox(#[from] tracker_outbox::OutboxError),
}

/// Result type alias using TrackerError.
pub type TrackerResult<T> = Result<T, TrackerError>;
