//! Durable storage abstraction for the tracker event queue.
//!
//! This crate provides the key-value storage backends the durable event
//! log is persisted to:
//! - **FileStore**: one file per key under a data directory
//! - **MemoryStore**: in-process map, for tests and opt-out mode

mod file;
mod memory;
mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;

use thiserror::Error;

/// Error type for storage operations.
///
/// A failed write is fatal for that operation; nothing here retries.
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific error
    #[error("Storage error: {0}")]
    Backend(String),

    /// No usable data directory on this platform
    #[error("No data directory available")]
    NoDataDir,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
