//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use vigil_core::poll::FetchError;
use vigil_core::sinks::{Dispatch, ErrorSink};
use vigil_core::transport::{RawResponse, Transport};
use vigil_core::{DashboardEndpoint, PollingController, QueryParams, RetryPolicy};

pub const BASE_URL: &str = "http://backend.test:5000";
pub const DASHBOARD_URL: &str = "http://backend.test:5000/api/bybit/dashboard-data";

/// One scripted answer: wait `delay`, then return `result`.
#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub result: Result<RawResponse, FetchError>,
}

impl Step {
    pub fn ok(body: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(RawResponse::ok(body)),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(RawResponse::with_status(status, "error")),
        }
    }

    pub fn network() -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(FetchError::Network {
                url: DASHBOARD_URL.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub url: String,
    pub query: Vec<(String, String)>,
}

/// Replays a script, then repeats the fallback step forever.
///
/// Tracks how many requests are in progress at once; an attempt abandoned
/// by its deadline stops counting when its future is dropped.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: Mutex<Vec<Call>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub fn new(script: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    pub fn repeating(step: Step) -> Arc<Self> {
        Self::new(Vec::new(), step)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        _timeout: Duration,
    ) -> Result<RawResponse, FetchError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _active = ActiveGuard(&self.active);
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        self.calls.lock().unwrap().push(Call {
            at: Instant::now(),
            url: url.to_string(),
            query: query.to_vec(),
        });

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        tokio::time::sleep(step.delay).await;
        step.result
    }
}

/// Error sink that records what it was told.
#[derive(Default)]
pub struct RecordingErrorSink {
    pub errors: Mutex<Vec<String>>,
    pub clears: Mutex<Vec<DateTime<Utc>>>,
}

impl RecordingErrorSink {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.lock().unwrap().len()
    }
}

impl ErrorSink for RecordingErrorSink {
    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn clear_error(&self, refreshed_at: DateTime<Utc>) {
        self.clears.lock().unwrap().push(refreshed_at);
    }
}

pub fn dashboard_body(total_balance: f64) -> String {
    format!(
        r#"{{"success": true, "data": {{"account": {{"total_balance": {}}}, "positions": [], "recent_trades": []}}}}"#,
        total_balance
    )
}

pub fn policy(timeout_ms: u64, max_retries: u32, base_delay_ms: u64) -> RetryPolicy {
    RetryPolicy {
        timeout: Duration::from_millis(timeout_ms),
        max_retries,
        base_delay: Duration::from_millis(base_delay_ms),
    }
}

pub fn dashboard_controller(
    transport: Arc<ScriptedTransport>,
    sinks: Arc<dyn Dispatch<vigil_core::DashboardData>>,
    errors: Arc<RecordingErrorSink>,
    policy: RetryPolicy,
) -> Arc<PollingController<DashboardEndpoint>> {
    PollingController::builder(DashboardEndpoint, transport, sinks)
        .base_url(BASE_URL)
        .policy(policy)
        .params(QueryParams::symbol("ETHUSDT"))
        .error_sink(errors)
        .build()
}
