use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::sinks::DispatchReport;

/// Deadline and retry settings for one poll's attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Total attempts before the failure is terminal.
    pub max_retries: u32,
    /// Base of the linear backoff: attempt `n` failing waits `base_delay * n`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Number of attempts actually made; a zero setting still tries once.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay to wait after the given 1-based attempt failed.
    pub fn backoff_after(&self, failed_attempt: u32) -> Duration {
        self.base_delay * failed_attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Ordered query parameters sent with every request of a poller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters selecting a single trading symbol.
    pub fn symbol(symbol: &str) -> Self {
        Self::new().with("symbol", symbol)
    }

    /// Return a copy with `key` set to `value`, replacing an existing entry.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.0.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Immutable descriptor of what one poll fetches.
///
/// Rebuilt by the controller whenever its parameters change; an in-flight
/// poll keeps the descriptor it started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    url: String,
    query: QueryParams,
    policy: RetryPolicy,
}

impl PollRequest {
    pub fn new(url: impl Into<String>, query: QueryParams, policy: RetryPolicy) -> Self {
        Self {
            url: url.into(),
            query,
            policy,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

/// Classification of a failed attempt, used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The attempt missed its deadline
    Timeout,
    /// Transport-level failure (refused connection, DNS, broken stream)
    Network,
    /// Non-2xx status, malformed body, or the backend reported failure
    Application,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network"),
            FailureKind::Application => write!(f, "application"),
        }
    }
}

/// What a call to `poll_once` did.
#[derive(Debug)]
pub enum PollOutcome {
    /// Another poll was in flight; nothing happened.
    Skipped,
    /// Data was fetched and dispatched. Sink failures are reported, not fatal.
    Succeeded { attempts: u32, report: DispatchReport },
    /// Every attempt failed and the error sink was notified.
    Failed { kind: FailureKind, attempts: u32 },
}

impl PollOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, PollOutcome::Skipped)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Succeeded { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PollOutcome::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
