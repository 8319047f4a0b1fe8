use std::time::Duration;

use crate::errors::VigilError;
use crate::poll::types::FailureKind;

/// Failure of a single request attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} timed out after {}ms", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    #[error("Network error contacting {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed response from {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("{url} reported failure: {message}")]
    Rejected { url: String, message: String },
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Timeout { .. } => FailureKind::Timeout,
            FetchError::Network { .. } => FailureKind::Network,
            FetchError::Status { .. }
            | FetchError::Malformed { .. }
            | FetchError::Rejected { .. } => FailureKind::Application,
        }
    }
}

impl VigilError for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "FETCH_TIMEOUT",
            FetchError::Network { .. } => "FETCH_NETWORK_ERROR",
            FetchError::Status { .. } => "FETCH_BAD_STATUS",
            FetchError::Malformed { .. } => "FETCH_MALFORMED_RESPONSE",
            FetchError::Rejected { .. } => "FETCH_REJECTED",
        }
    }
}

/// Terminal failure of a poll after every attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Failed to fetch {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        last: FetchError,
    },
}

impl PollError {
    /// Classification of the last attempt's failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            PollError::Exhausted { last, .. } => last.kind(),
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollError::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn last_error(&self) -> &FetchError {
        match self {
            PollError::Exhausted { last, .. } => last,
        }
    }

    /// Message shown to the user by the error sink.
    ///
    /// `retry_scheduled` is true when a network failure has an extra poll
    /// queued, so the message can say so.
    pub fn user_message(&self, retry_scheduled: bool) -> String {
        match self.last_error() {
            FetchError::Timeout { .. } => {
                "Request timeout - please check your connection".to_string()
            }
            FetchError::Network { .. } if retry_scheduled => {
                "Network connection error - retrying...".to_string()
            }
            FetchError::Network { .. } => "Network connection error".to_string(),
            FetchError::Rejected { message, .. } => message.clone(),
            other => format!("Error loading data: {}", other),
        }
    }
}

impl VigilError for PollError {
    fn error_code(&self) -> &'static str {
        match self {
            PollError::Exhausted { .. } => "POLL_RETRIES_EXHAUSTED",
        }
    }
}
