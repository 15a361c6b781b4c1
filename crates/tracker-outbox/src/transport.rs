//! Beacon transport: one-way GET delivery of formatted hit URLs.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Transport error type.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request failed before a response arrived
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Collector answered with a non-success status
    #[error("Collector returned status {0}")]
    Status(u16),
}

/// Trait for one-way beacon delivery.
///
/// A send has exactly one success signal; errors are reported but the
/// queue absorbs them, leaving the entry pending for a later drain.
pub trait Transport: Send + Sync {
    /// Fire a one-way GET for the given hit URL.
    fn send(&self, url: Url) -> BoxFuture<'_, Result<(), TransportError>>;
}

/// Beacon sender over a shared HTTP client.
///
/// The request body is ignored; only reaching the collector matters. No
/// timeout is applied: an in-flight beacon either confirms or is abandoned
/// when the process exits.
pub struct BeaconSender {
    client: reqwest::Client,
}

impl BeaconSender {
    /// Create a sender with a fresh client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a sender over an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for BeaconSender {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for BeaconSender {
    fn send(&self, url: Url) -> BoxFuture<'_, Result<(), TransportError>> {
        async move {
            debug!(url = %url, "firing beacon");
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }
            Ok(())
        }
        .boxed()
    }
}
