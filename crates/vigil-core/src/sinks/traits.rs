//! Render and error sink interfaces.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::sinks::errors::SinkError;

/// Accepts a freshly fetched value and produces a side effect.
///
/// Closures of the shape `Fn(&T) -> Result<(), SinkError>` are sinks, which
/// keeps test capture and one-off wiring short.
pub trait RenderSink<T: ?Sized>: Send + Sync {
    fn render(&self, value: &T) -> Result<(), SinkError>;
}

impl<T, F> RenderSink<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> Result<(), SinkError> + Send + Sync,
{
    fn render(&self, value: &T) -> Result<(), SinkError> {
        self(value)
    }
}

/// Receives terminal poll failures and the signal that data is fresh again.
pub trait ErrorSink: Send + Sync {
    /// Called once per terminal failure with a user-facing message.
    fn show_error(&self, message: &str);

    /// Called after every successful poll.
    fn clear_error(&self, refreshed_at: DateTime<Utc>);
}

/// Error sink that only logs. Used by pollers whose failures are not shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorSink {
    pub name: &'static str,
}

impl LogErrorSink {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl ErrorSink for LogErrorSink {
    fn show_error(&self, message: &str) {
        warn!(event = "core.sink.error_reported", poller = self.name, message = message);
    }

    fn clear_error(&self, refreshed_at: DateTime<Utc>) {
        info!(
            event = "core.sink.error_cleared",
            poller = self.name,
            refreshed_at = %refreshed_at
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_is_a_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |value: &[u32]| -> Result<(), SinkError> {
            seen.lock().unwrap().push(value.len());
            Ok(())
        };

        RenderSink::<[u32]>::render(&sink, &[1, 2, 3]).unwrap();
        RenderSink::<[u32]>::render(&sink, &[]).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![3, 0]);
    }

    #[test]
    fn test_log_error_sink_does_not_panic() {
        let sink = LogErrorSink::new("pnl_chart");
        sink.show_error("Error loading data: HTTP 500");
        sink.clear_error(Utc::now());
    }
}
