//! Tracker configuration and environment metadata.

use crate::{TrackerError, TrackerResult};
use std::time::Duration;

/// Collector domain the hit subdomain is joined to.
pub const COLLECTOR_DOMAIN: &str = "xiti.com";

/// Interval between audio refresh ticks while playback is running.
pub const DEFAULT_AUDIO_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Site identifier assigned by the collector (`s` parameter).
    pub site_id: String,
    /// Log subdomain including scheme, e.g. `https://logs1252`.
    pub subdomain: String,
    /// Collector domain, joined to the subdomain.
    pub collector_domain: String,
    /// Interval between audio refresh ticks.
    pub audio_refresh_interval: Duration,
}

impl TrackerConfig {
    /// Configuration with default collector domain and refresh interval.
    pub fn new(site_id: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            subdomain: subdomain.into(),
            collector_domain: COLLECTOR_DOMAIN.to_string(),
            audio_refresh_interval: DEFAULT_AUDIO_REFRESH_INTERVAL,
        }
    }

    /// Fail fast on missing mandatory values.
    pub fn validate(&self) -> TrackerResult<()> {
        if self.site_id.is_empty() {
            return Err(TrackerError::MissingConfig("id"));
        }
        if self.subdomain.is_empty() {
            return Err(TrackerError::MissingConfig("subdomain"));
        }
        Ok(())
    }
}

/// Client environment metadata stamped on every hit.
///
/// A browser fills these from `window.screen` and `navigator`; an embedded
/// client supplies whatever it knows and leaves the rest at defaults.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Screen width in pixels.
    pub screen_width: u32,
    /// Screen height in pixels.
    pub screen_height: u32,
    /// Pixel depth in bits.
    pub pixel_depth: u32,
    /// Color depth in bits.
    pub color_depth: u32,
    /// Whether a java plugin is available (`jv` flag).
    pub java_enabled: bool,
    /// Client locale (`lng` parameter).
    pub locale: String,
    /// Referrer attached to page views, when known.
    pub referrer: Option<String>,
}

impl Environment {
    /// `r` parameter: `WxHxPixelDepthxColorDepth`.
    pub fn screen_properties(&self) -> String {
        format!(
            "{}x{}x{}x{}",
            self.screen_width, self.screen_height, self.pixel_depth, self.color_depth
        )
    }

    /// `re` parameter: `WxH`.
    pub fn screen_size(&self) -> String {
        format!("{}x{}", self.screen_width, self.screen_height)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            screen_width: 0,
            screen_height: 0,
            pixel_depth: 0,
            color_depth: 0,
            java_enabled: false,
            locale: "en".to_string(),
            referrer: None,
        }
    }
}
