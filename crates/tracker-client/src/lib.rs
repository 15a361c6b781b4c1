//! Public tracking API.
//!
//! This crate ties the durable delivery queue to callers: it validates
//! trigger parameters per event taxonomy, formats collector hit URLs, and
//! owns the session state (config, custom variables, availability gate,
//! audio refresh timer).
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = Arc::new(FileStore::in_data_dir("tracker")?);
//! let tracker = Tracker::new(store, Arc::new(BeaconSender::new()), Environment::default());
//! tracker.initialize(TrackerConfig::new("515773", "https://logs1252")).await?;
//! tracker.track_page_view(PageViewParams {
//!     page: Some("discover::http://example.com/discover".into()),
//!     level: Some("1".into()),
//! }).await?;
//! ```

mod client;
mod config;
mod error;
mod format;

pub use client::{AudioEventParams, CustomEventParams, PageViewParams, Tracker};
pub use config::{Environment, TrackerConfig, COLLECTOR_DOMAIN, DEFAULT_AUDIO_REFRESH_INTERVAL};
pub use error::{TrackerError, TrackerResult};
pub use format::XitiFormatter;

// the event taxonomy callers pass through the trigger params
pub use tracker_outbox::AudioAction;
