//! Polling controller: cadence, single-flight guard and dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::Endpoint;
use crate::config::defaults::DEFAULT_BASE_URL;
use crate::poll::retry::fetch_with_retry;
use crate::poll::types::{FailureKind, PollOutcome, PollRequest, QueryParams, RetryPolicy};
use crate::sinks::{Dispatch, ErrorSink, LogErrorSink};
use crate::transport::Transport;

#[derive(Debug)]
struct ControllerState {
    params: QueryParams,
    request: Arc<PollRequest>,
    last_success: Option<DateTime<Utc>>,
}

/// Polls one endpoint and fans successful payloads out to its sinks.
///
/// At most one fetch sequence runs at a time per controller. Triggers that
/// arrive while one is running (timer ticks, manual refreshes, the extra
/// poll after a network failure) return [`PollOutcome::Skipped`].
///
/// A supplementary poll that fails on the network again only schedules
/// another one while the periodic timer runs, so a stopped controller makes
/// at most one extra request per manual poll.
pub struct PollingController<E: Endpoint> {
    endpoint: E,
    base_url: String,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    sinks: Arc<dyn Dispatch<E::Payload>>,
    error_sink: Arc<dyn ErrorSink>,
    network_retry_delay: Option<Duration>,
    in_flight: AtomicBool,
    state: Mutex<ControllerState>,
    timer: Mutex<Option<CancellationToken>>,
    retries: Mutex<CancellationToken>,
}

/// Builder for [`PollingController`].
pub struct ControllerBuilder<E: Endpoint> {
    endpoint: E,
    transport: Arc<dyn Transport>,
    sinks: Arc<dyn Dispatch<E::Payload>>,
    base_url: String,
    policy: RetryPolicy,
    params: QueryParams,
    error_sink: Option<Arc<dyn ErrorSink>>,
    network_retry_delay: Option<Duration>,
}

impl<E: Endpoint> ControllerBuilder<E> {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Where terminal failures are reported. Defaults to logging only.
    pub fn error_sink(mut self, error_sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = Some(error_sink);
        self
    }

    /// Schedule one extra poll `delay` after a terminal network failure.
    pub fn network_retry(mut self, delay: Duration) -> Self {
        self.network_retry_delay = Some(delay);
        self
    }

    pub fn build(self) -> Arc<PollingController<E>> {
        let url = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.path()
        );
        let request = Arc::new(PollRequest::new(url, self.params.clone(), self.policy));
        let error_sink = self
            .error_sink
            .unwrap_or_else(|| Arc::new(LogErrorSink::new(self.endpoint.name())));

        Arc::new(PollingController {
            endpoint: self.endpoint,
            base_url: self.base_url,
            transport: self.transport,
            policy: self.policy,
            sinks: self.sinks,
            error_sink,
            network_retry_delay: self.network_retry_delay,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(ControllerState {
                params: self.params,
                request,
                last_success: None,
            }),
            timer: Mutex::new(None),
            retries: Mutex::new(CancellationToken::new()),
        })
    }
}

/// What started a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// Timer tick, manual refresh or any other caller of `poll_once`
    Direct,
    /// The supplementary poll after a terminal network failure
    NetworkRetry,
}

/// Clears the in-flight flag on every exit path, including a dropped future.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl<E: Endpoint> PollingController<E> {
    pub fn builder(
        endpoint: E,
        transport: Arc<dyn Transport>,
        sinks: Arc<dyn Dispatch<E::Payload>>,
    ) -> ControllerBuilder<E> {
        ControllerBuilder {
            endpoint,
            transport,
            sinks,
            base_url: DEFAULT_BASE_URL.to_string(),
            policy: RetryPolicy::default(),
            params: QueryParams::new(),
            error_sink: None,
            network_retry_delay: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.endpoint.name()
    }

    /// Replace the query parameters used by the next poll.
    ///
    /// A poll already in flight keeps the request it started with.
    pub fn configure(&self, params: QueryParams) {
        let url = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.path()
        );
        let mut state = self.lock_state();
        state.request = Arc::new(PollRequest::new(url, params.clone(), self.policy));
        state.params = params;

        info!(
            event = "core.poll.configured",
            poller = self.name(),
            params = ?state.params.as_slice()
        );
    }

    /// Run one poll unless one is already in flight.
    ///
    /// The returned future owns a handle to the controller, so it can be
    /// spawned. Dropping it mid-flight releases the guard.
    pub fn poll_once(self: &Arc<Self>) -> BoxFuture<'static, PollOutcome> {
        let this = Arc::clone(self);
        async move { this.run_poll(Trigger::Direct).await }.boxed()
    }

    /// Manual trigger; same semantics as [`Self::poll_once`].
    pub fn refresh(self: &Arc<Self>) -> BoxFuture<'static, PollOutcome> {
        self.poll_once()
    }

    /// Poll every `interval`, replacing any timer already running.
    ///
    /// The first tick fires one interval from now. Each tick spawns its poll
    /// as a separate task, so [`Self::stop`] never cancels a poll in flight.
    /// The timer holds only a weak handle and ends when the controller is
    /// dropped.
    pub fn start_periodic(self: &Arc<Self>, interval: Duration) {
        if interval.is_zero() {
            warn!(
                event = "core.poll.timer_rejected",
                poller = self.name(),
                reason = "zero interval"
            );
            return;
        }

        let token = CancellationToken::new();
        if let Some(previous) = self.lock_timer().replace(token.clone()) {
            previous.cancel();
            debug!(event = "core.poll.timer_replaced", poller = self.name());
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let name = self.name();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(controller) = weak.upgrade() else {
                            break;
                        };
                        tokio::spawn(controller.poll_once());
                    }
                }
            }

            debug!(event = "core.poll.timer_stopped", poller = name);
        });

        info!(
            event = "core.poll.timer_started",
            poller = self.name(),
            interval_ms = interval.as_millis() as u64
        );
    }

    /// Cancel the periodic timer and any pending network retry. A poll in
    /// flight still completes and dispatches, but does not schedule a retry.
    pub fn stop(&self) {
        if let Some(token) = self.lock_timer().take() {
            token.cancel();
            info!(event = "core.poll.timer_cancelled", poller = self.name());
        }
        let pending = std::mem::replace(&mut *self.lock_retries(), CancellationToken::new());
        pending.cancel();
    }

    pub fn is_polling(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_periodic_running(&self) -> bool {
        self.lock_timer()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.lock_state().last_success
    }

    pub fn parameters(&self) -> QueryParams {
        self.lock_state().params.clone()
    }

    /// The request the next poll will issue.
    pub fn request(&self) -> Arc<PollRequest> {
        Arc::clone(&self.lock_state().request)
    }

    async fn run_poll(self: Arc<Self>, trigger: Trigger) -> PollOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!(event = "core.poll.skipped", poller = self.name());
            return PollOutcome::Skipped;
        };
        let retries = self.lock_retries().clone();

        let request = self.request();
        info!(
            event = "core.poll.started",
            poller = self.name(),
            url = request.url(),
            params = ?request.query().as_slice()
        );

        let endpoint = &self.endpoint;
        let result = fetch_with_retry(self.transport.as_ref(), &request, |url, body| {
            endpoint.decode(url, body)
        })
        .await;

        match result {
            Ok(fetched) => {
                let report = self.sinks.dispatch(&fetched.payload);
                let refreshed_at = Utc::now();
                self.lock_state().last_success = Some(refreshed_at);
                self.error_sink.clear_error(refreshed_at);

                info!(
                    event = "core.poll.completed",
                    poller = self.name(),
                    attempts = fetched.attempts,
                    delivered = report.delivered.len(),
                    sink_failures = report.failures.len()
                );

                PollOutcome::Succeeded {
                    attempts: fetched.attempts,
                    report,
                }
            }
            Err(e) => {
                let kind = e.kind();
                let chain_allowed = match trigger {
                    Trigger::Direct => true,
                    Trigger::NetworkRetry => self.is_periodic_running(),
                };
                let retry_delay = match kind {
                    FailureKind::Network if chain_allowed && !retries.is_cancelled() => {
                        self.network_retry_delay
                    }
                    _ => None,
                };

                error!(
                    event = "core.poll.failed",
                    poller = self.name(),
                    kind = %kind,
                    attempts = e.attempts(),
                    error = %e
                );

                self.error_sink
                    .show_error(&e.user_message(retry_delay.is_some()));

                if let Some(delay) = retry_delay {
                    self.schedule_network_retry(delay, retries);
                }

                PollOutcome::Failed {
                    kind,
                    attempts: e.attempts(),
                }
            }
        }
    }

    fn schedule_network_retry(self: &Arc<Self>, delay: Duration, cancel: CancellationToken) {
        info!(
            event = "core.poll.network_retry_scheduled",
            poller = self.name(),
            delay_ms = delay.as_millis() as u64
        );

        let weak = Arc::downgrade(self);
        let name = self.name();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(event = "core.poll.network_retry_cancelled", poller = name);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            let Some(controller) = weak.upgrade() else {
                return;
            };
            if controller.is_polling() {
                debug!(
                    event = "core.poll.network_retry_absorbed",
                    poller = controller.name()
                );
                return;
            }
            controller.run_poll(Trigger::NetworkRetry).await;
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_retries(&self) -> MutexGuard<'_, CancellationToken> {
        self.retries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Endpoint> Drop for PollingController<E> {
    fn drop(&mut self) {
        let timer = self.timer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = timer.take() {
            token.cancel();
        }
        self.retries
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

impl<E: Endpoint> std::fmt::Debug for PollingController<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingController")
            .field("endpoint", &self.name())
            .field("base_url", &self.base_url)
            .field("policy", &self.policy)
            .field("is_polling", &self.is_polling())
            .finish()
    }
}
