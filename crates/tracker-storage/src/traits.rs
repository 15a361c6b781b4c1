//! Storage trait definitions.

use crate::StorageResult;
use tracing::debug;

/// Key used by the availability probe.
const PROBE_KEY: &str = "storage-probe";

/// Trait for durable key-value storage backends.
///
/// The medium only supports whole-value replacement: callers persist a
/// complete serialized blob per key, never partial updates.
pub trait KeyValueStore: Send + Sync {
    /// Store a value under a key, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value. Returns None if the key has never been written.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value. Returns true if the key existed.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Probe whether the backend is usable by writing and deleting a
    /// sentinel value.
    ///
    /// Callers are expected to run the probe once per session and cache
    /// the result; a backend that fails its first probe is treated as
    /// permanently unavailable for that session.
    fn is_available(&self) -> bool {
        let usable = self
            .set(PROBE_KEY, "1")
            .and_then(|_| self.delete(PROBE_KEY))
            .is_ok();
        if !usable {
            debug!("storage probe failed, backend unavailable");
        }
        usable
    }
}
