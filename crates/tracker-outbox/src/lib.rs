//! Durable delivery queue for tracker events.
//!
//! This crate provides:
//! - DurableLog: persisted ordered log of pending events, one blob per key
//! - DeliveryQueue: enqueue, drain, and confirm lifecycle for pending events
//! - BeaconSender: fire-and-forget GET transport for formatted hit URLs
//!
//! Delivery is at-least-once: an attempt that fails or never resolves leaves
//! its entry pending in the durable log, to be retried on the next drain
//! (triggered by the next enqueue or the next startup).

mod error;
mod event;
mod log;
mod queue;
mod transport;

pub use error::{OutboxError, OutboxResult};
pub use event::{AudioAction, Event, QueueEntry};
pub use log::{DurableLog, EVENTS_KEY};
pub use queue::{DeliveryQueue, HitFormatter};
pub use transport::{BeaconSender, Transport, TransportError};
