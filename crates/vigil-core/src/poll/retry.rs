//! Bounded-timeout fetch with linear-backoff retries.
//!
//! Usable on its own; [`super::PollingController`] wraps it with the
//! single-flight guard and sink dispatch.

use tracing::{debug, warn};

use crate::poll::errors::{FetchError, PollError};
use crate::poll::types::PollRequest;
use crate::transport::Transport;

/// A decoded payload plus the number of attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub payload: T,
    pub attempts: u32,
}

/// Fetch `request` until an attempt succeeds or the policy is exhausted.
///
/// Each attempt is bounded by the policy timeout. A non-2xx status or a body
/// that `decode` rejects fails the attempt like any transport error. After
/// failed attempt `n` (1-based) the loop sleeps `base_delay * n`; there is
/// no sleep after the last attempt.
///
/// # Errors
///
/// Returns [`PollError::Exhausted`] carrying the last attempt's error.
pub async fn fetch_with_retry<T, D>(
    transport: &dyn Transport,
    request: &PollRequest,
    decode: D,
) -> Result<Fetched<T>, PollError>
where
    D: Fn(&str, &[u8]) -> Result<T, FetchError>,
{
    let policy = request.policy();
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match run_attempt(transport, request, &decode).await {
            Ok(payload) => {
                debug!(
                    event = "core.poll.attempt_succeeded",
                    url = request.url(),
                    attempt = attempt
                );
                return Ok(Fetched {
                    payload,
                    attempts: attempt,
                });
            }
            Err(error) if attempt >= max_attempts => {
                warn!(
                    event = "core.poll.attempts_exhausted",
                    url = request.url(),
                    attempts = attempt,
                    kind = %error.kind(),
                    error = %error
                );
                return Err(PollError::Exhausted {
                    url: request.url().to_string(),
                    attempts: attempt,
                    last: error,
                });
            }
            Err(error) => {
                let delay = policy.backoff_after(attempt);
                warn!(
                    event = "core.poll.attempt_failed",
                    url = request.url(),
                    attempt = attempt,
                    max_attempts = max_attempts,
                    kind = %error.kind(),
                    retry_in_ms = delay.as_millis() as u64,
                    error = %error
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn run_attempt<T, D>(
    transport: &dyn Transport,
    request: &PollRequest,
    decode: &D,
) -> Result<T, FetchError>
where
    D: Fn(&str, &[u8]) -> Result<T, FetchError>,
{
    let timeout = request.policy().timeout;
    let response = tokio::time::timeout(
        timeout,
        transport.get(request.url(), request.query().as_slice(), timeout),
    )
    .await
    .map_err(|_| FetchError::Timeout {
        url: request.url().to_string(),
        timeout,
    })??;

    if !response.is_success() {
        return Err(FetchError::Status {
            url: request.url().to_string(),
            status: response.status,
        });
    }

    decode(request.url(), &response.body)
}
