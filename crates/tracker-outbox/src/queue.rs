//! Delivery queue: the lifecycle of pending events.

use crate::{DurableLog, Event, OutboxResult, QueueEntry, Transport};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Trait for turning a validated event into its delivery URL.
pub trait HitFormatter: Send + Sync {
    /// Format the hit URL for an event.
    fn format_url(&self, event: &Event) -> Result<Url, url::ParseError>;
}

/// Durable delivery queue.
///
/// Entry lifecycle: pending (in the log) → in-flight (attempt spawned) →
/// confirmed (removed from the log). There is no failed state: an attempt
/// that errors or never resolves leaves its entry pending until the next
/// drain, giving at-least-once redelivery across restarts.
///
/// Every log mutation is a whole-log read-modify-write; all of them are
/// serialized through one in-process lock so interleaved confirmations
/// cannot clobber each other's removals.
pub struct DeliveryQueue {
    log: DurableLog,
    formatter: Arc<dyn HitFormatter>,
    transport: Arc<dyn Transport>,
    mutation_lock: Mutex<()>,
}

impl DeliveryQueue {
    /// Create a queue over a durable log.
    pub fn new(
        log: DurableLog,
        formatter: Arc<dyn HitFormatter>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            log,
            formatter,
            transport,
            mutation_lock: Mutex::new(()),
        }
    }

    /// Recover the queue at startup.
    ///
    /// Re-drives any events that survived a restart without being
    /// confirmed; resets the log to explicitly empty otherwise.
    pub async fn initialize(self: &Arc<Self>) -> OutboxResult<()> {
        if self.log.has_pending()? {
            let attempts = self.drain().await?;
            info!(attempts, "recovered pending events from durable log");
        } else {
            let _guard = self.mutation_lock.lock().await;
            self.log.clear()?;
        }
        Ok(())
    }

    /// Append an event to the durable log and immediately drain.
    ///
    /// Returns the entry's identifier. The event is persisted before this
    /// returns; delivery happens asynchronously.
    pub async fn enqueue(self: &Arc<Self>, event: Event) -> OutboxResult<String> {
        let id = {
            let _guard = self.mutation_lock.lock().await;
            let mut entries = self.log.read()?;
            let id = next_id(&entries);
            entries.push(QueueEntry::new(id.clone(), event));
            self.log.write(&entries)?;
            id
        };
        debug!(id = %id, "enqueued event");
        self.drain().await?;
        Ok(id)
    }

    /// Start a delivery attempt for every pending entry, in log order.
    ///
    /// Attempts run concurrently; drain returns the number started without
    /// waiting for any to settle. Removal happens only in the confirmation
    /// path. Empty placeholders are skipped, never redelivered.
    pub async fn drain(self: &Arc<Self>) -> OutboxResult<usize> {
        let entries = self.log.read()?;
        let mut attempts = 0;
        for entry in entries {
            let event = match entry.event {
                Some(event) => event,
                None => continue,
            };
            let url = match self.formatter.format_url(&event) {
                Ok(url) => url,
                Err(e) => {
                    warn!(id = %entry.id, error = %e, "could not format hit URL, entry stays pending");
                    continue;
                }
            };
            let queue = Arc::clone(self);
            let id = entry.id;
            tokio::spawn(async move {
                match queue.transport.send(url).await {
                    Ok(()) => {
                        if let Err(e) = queue.confirm(&id).await {
                            warn!(id = %id, error = %e, "confirmation failed, entry stays pending");
                        }
                    }
                    Err(e) => {
                        debug!(id = %id, error = %e, "delivery attempt failed, entry stays pending");
                    }
                }
            });
            attempts += 1;
        }
        if attempts > 0 {
            debug!(attempts, "drain started delivery attempts");
        }
        Ok(attempts)
    }

    /// Handle a delivery confirmation for an identifier.
    ///
    /// Re-reads the current log (not any drain-time snapshot), empties the
    /// matching entry, and persists the result; collapses to the explicit
    /// empty log when nothing pending remains. Idempotent: a second
    /// confirmation finds no entry and leaves the log unchanged.
    pub async fn confirm(&self, id: &str) -> OutboxResult<()> {
        let _guard = self.mutation_lock.lock().await;
        let mut entries = self.log.read()?;
        let confirmed = match entries.iter_mut().find(|e| e.id == id && !e.is_empty()) {
            Some(entry) => {
                entry.event = None;
                true
            }
            None => false,
        };
        if !confirmed {
            debug!(id = %id, "confirmation for unknown identifier, log unchanged");
            return Ok(());
        }
        if entries.iter().all(|e| e.is_empty()) {
            self.log.clear()?;
        } else {
            self.log.write(&entries)?;
        }
        debug!(id = %id, "delivery confirmed, entry removed");
        Ok(())
    }

    /// Currently pending entries.
    pub fn pending(&self) -> OutboxResult<Vec<QueueEntry>> {
        Ok(self
            .log
            .read()?
            .into_iter()
            .filter(|e| !e.is_empty())
            .collect())
    }

    /// Number of currently pending entries.
    pub fn pending_count(&self) -> OutboxResult<usize> {
        Ok(self.pending()?.len())
    }
}

/// Random identifier that does not collide with any pending entry.
fn next_id(entries: &[QueueEntry]) -> String {
    loop {
        let id = uuid::Uuid::new_v4().to_string();
        if !entries.iter().any(|e| e.id == id) {
            return id;
        }
    }
}
