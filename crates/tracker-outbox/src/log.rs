//! Durable log of pending queue entries.

use crate::{OutboxResult, QueueEntry};
use std::sync::Arc;
use tracker_storage::KeyValueStore;
use tracing::debug;

/// Storage key for the persisted event log.
///
/// Kept from earlier versions of the library so a queue persisted before an
/// upgrade is recovered rather than dropped.
pub const EVENTS_KEY: &str = "ati-events";

/// Ordered log of queue entries, persisted as one JSON blob.
///
/// All queue mutations funnel through [`DurableLog::write`], which drops
/// empty placeholders so the persisted log never contains them.
pub struct DurableLog {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl DurableLog {
    /// Create a log persisted under [`EVENTS_KEY`].
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, EVENTS_KEY)
    }

    /// Create a log persisted under a custom key.
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Read the persisted log. Returns an empty sequence when nothing has
    /// been persisted yet.
    pub fn read(&self) -> OutboxResult<Vec<QueueEntry>> {
        match self.store.get(&self.key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persist the given entries as the new log, dropping empty placeholders.
    ///
    /// A log where every entry is empty collapses to an explicitly empty
    /// array. Storage failures propagate to the caller; nothing is retried.
    pub fn write(&self, entries: &[QueueEntry]) -> OutboxResult<()> {
        let pending: Vec<&QueueEntry> = entries.iter().filter(|e| !e.is_empty()).collect();
        let raw = serde_json::to_string(&pending)?;
        self.store.set(&self.key, &raw)?;
        debug!(key = %self.key, pending = pending.len(), "persisted event log");
        Ok(())
    }

    /// Reset the log to explicitly empty.
    pub fn clear(&self) -> OutboxResult<()> {
        self.write(&[])
    }

    /// Whether the persisted log holds any non-empty entry.
    pub fn has_pending(&self) -> OutboxResult<bool> {
        Ok(self.read()?.iter().any(|e| !e.is_empty()))
    }
}
