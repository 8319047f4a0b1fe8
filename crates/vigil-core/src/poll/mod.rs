//! Resilient polling of a single backend endpoint.
//!
//! [`fetch_with_retry`] bounds each attempt with a deadline and retries with
//! linear backoff. [`PollingController`] adds the single-flight guard, the
//! periodic timer, sink dispatch and error reporting on top.

pub mod controller;
pub mod errors;
pub mod retry;
pub mod types;

pub use controller::{ControllerBuilder, PollingController};
pub use errors::{FetchError, PollError};
pub use retry::{Fetched, fetch_with_retry};
pub use types::{FailureKind, PollOutcome, PollRequest, QueryParams, RetryPolicy};
