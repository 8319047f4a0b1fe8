//! Transport trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::poll::FetchError;

/// Status and body of a completed HTTP exchange.
///
/// Non-2xx statuses are still a `RawResponse`; deciding that they are
/// failures belongs to the retry loop, not the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait defining how a poller reaches the backend.
///
/// The production implementation is [`super::HttpTransport`]; tests script
/// their own to control latency and failures.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request for `url` with the given query parameters.
    ///
    /// `timeout` is the per-attempt deadline. Implementations may enforce it
    /// themselves, but the retry loop always enforces it as well.
    ///
    /// Transport-level problems must be reported as [`FetchError::Network`]
    /// or [`FetchError::Timeout`].
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<RawResponse, FetchError>;
}
