//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::poll::FetchError;
use crate::transport::traits::{RawResponse, Transport};

/// HTTP transport backed by a shared `reqwest::Client`.
///
/// The client is cheap to clone and pools connections, so one instance is
/// shared by every controller of a dashboard.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<RawResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        debug!(
            event = "core.transport.response_received",
            url = url,
            status = status,
            bytes = body.len()
        );

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Map a reqwest error onto the fetch error taxonomy.
fn classify_error(url: &str, timeout: Duration, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else if error.is_decode() {
        FetchError::Malformed {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        // Connect, request and body-stream failures are all transport level
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
