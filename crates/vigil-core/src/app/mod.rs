//! Dashboard root: owns the three pollers and their wiring.
//!
//! The dashboard poller drives the account, positions, trades, PnL and
//! market sinks and reports failures to the error sink. The two chart
//! pollers (PnL series and trading stats) only log their failures.
//!
//! Choosing a chart period is a one-shot reload from
//! `/api/chart-data/{chart_id}`; the periodic chart polls keep asking for
//! their default view.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::api::types::{DashboardData, PnlSeries, TradingStats};
use crate::api::{ChartDataEndpoint, DashboardEndpoint, PnlChartEndpoint, TradingStatsEndpoint};
use crate::config::VigilConfig;
use crate::events;
use crate::poll::{PollOutcome, PollingController, QueryParams};
use crate::render::{PanelOutput, StatusPanel, dashboard_panels, performance_panel, pnl_chart_panel};
use crate::sinks::{Dispatch, ErrorSink};
use crate::transport::Transport;

/// Chart id of the PnL line chart on the backend.
pub const PNL_CHART_ID: &str = "pnl";

/// Sinks for every payload the dashboard fetches.
pub struct DashboardSinkSet {
    pub dashboard: Arc<dyn Dispatch<DashboardData>>,
    pub pnl_chart: Arc<dyn Dispatch<PnlSeries>>,
    pub trading_stats: Arc<dyn Dispatch<TradingStats>>,
    pub errors: Arc<dyn ErrorSink>,
    /// Where period reloads of each chart id are delivered.
    pub chart_series: BTreeMap<String, Arc<dyn Dispatch<PnlSeries>>>,
}

impl DashboardSinkSet {
    /// Text panels for everything, written to `output`. Period reloads of
    /// the PnL chart land in the PnL chart panel.
    pub fn panels(output: Arc<dyn PanelOutput>) -> Self {
        let pnl_chart: Arc<dyn Dispatch<PnlSeries>> = Arc::new(pnl_chart_panel(output.clone()));
        Self {
            dashboard: Arc::new(dashboard_panels(output.clone())),
            pnl_chart: pnl_chart.clone(),
            trading_stats: Arc::new(performance_panel(output.clone())),
            errors: Arc::new(StatusPanel::new(output)),
            chart_series: BTreeMap::from([(PNL_CHART_ID.to_string(), pnl_chart)]),
        }
    }

    /// Deliver period reloads of `chart_id` to `sink`.
    pub fn with_chart_series(
        mut self,
        chart_id: impl Into<String>,
        sink: Arc<dyn Dispatch<PnlSeries>>,
    ) -> Self {
        self.chart_series.insert(chart_id.into(), sink);
        self
    }
}

pub struct DashboardApp {
    dashboard: Arc<PollingController<DashboardEndpoint>>,
    pnl_chart: Option<Arc<PollingController<PnlChartEndpoint>>>,
    trading_stats: Option<Arc<PollingController<TradingStatsEndpoint>>>,
    chart_data: BTreeMap<String, Arc<PollingController<ChartDataEndpoint>>>,
    dashboard_interval: Duration,
    chart_interval: Duration,
    base_url: String,
}

impl DashboardApp {
    /// Build the pollers from configuration. Nothing is fetched until
    /// [`Self::start`] or a manual refresh.
    pub fn new(
        config: &VigilConfig,
        transport: Arc<dyn Transport>,
        sinks: DashboardSinkSet,
    ) -> Self {
        let base_url = config.server.base_url().to_string();

        let dashboard = PollingController::builder(
            DashboardEndpoint,
            transport.clone(),
            sinks.dashboard,
        )
        .base_url(base_url.clone())
        .policy(config.dashboard.retry_policy())
        .params(QueryParams::symbol(config.dashboard.symbol()))
        .error_sink(sinks.errors)
        .network_retry(config.dashboard.network_retry_delay())
        .build();

        let (pnl_chart, trading_stats, chart_data) = if config.charts.enabled() {
            let pnl_chart =
                PollingController::builder(PnlChartEndpoint, transport.clone(), sinks.pnl_chart)
                    .base_url(base_url.clone())
                    .policy(config.charts.retry_policy())
                    .build();
            let trading_stats = PollingController::builder(
                TradingStatsEndpoint,
                transport.clone(),
                sinks.trading_stats,
            )
            .base_url(base_url.clone())
            .policy(config.charts.retry_policy())
            .build();
            let chart_data = sinks
                .chart_series
                .into_iter()
                .map(|(chart_id, sink)| {
                    let controller = PollingController::builder(
                        ChartDataEndpoint::new(chart_id.clone()),
                        transport.clone(),
                        sink,
                    )
                    .base_url(base_url.clone())
                    .policy(config.charts.retry_policy())
                    .build();
                    (chart_id, controller)
                })
                .collect();
            (Some(pnl_chart), Some(trading_stats), chart_data)
        } else {
            (None, None, BTreeMap::new())
        };

        Self {
            dashboard,
            pnl_chart,
            trading_stats,
            chart_data,
            dashboard_interval: config.dashboard.interval(),
            chart_interval: config.charts.interval(),
            base_url,
        }
    }

    /// Load everything once, then start the periodic timers.
    ///
    /// Returns the outcome of the initial dashboard poll.
    pub async fn start(&self) -> PollOutcome {
        events::log_dashboard_started(&self.base_url, &self.symbol(), self.charts_enabled());

        let (outcome, _, _) = futures::join!(
            self.dashboard.poll_once(),
            self.refresh_pnl_chart(),
            self.refresh_trading_stats()
        );

        self.dashboard.start_periodic(self.dashboard_interval);
        if let Some(pnl_chart) = &self.pnl_chart {
            pnl_chart.start_periodic(self.chart_interval);
        }
        if let Some(trading_stats) = &self.trading_stats {
            trading_stats.start_periodic(self.chart_interval);
        }

        outcome
    }

    /// Cancel every timer. Polls in flight still complete.
    pub fn stop(&self) {
        self.cancel_timers();
        events::log_dashboard_stopped();
    }

    fn cancel_timers(&self) {
        self.dashboard.stop();
        if let Some(pnl_chart) = &self.pnl_chart {
            pnl_chart.stop();
        }
        if let Some(trading_stats) = &self.trading_stats {
            trading_stats.stop();
        }
    }

    /// Manual refresh of the dashboard data.
    pub async fn refresh(&self) -> PollOutcome {
        self.dashboard.refresh().await
    }

    /// Manual refresh of both charts. `None` entries mean charts are off.
    pub async fn refresh_charts(&self) -> (Option<PollOutcome>, Option<PollOutcome>) {
        futures::join!(self.refresh_pnl_chart(), self.refresh_trading_stats())
    }

    /// Switch the dashboard to `symbol` and refresh immediately.
    ///
    /// If a poll is already in flight the refresh is skipped and the next
    /// scheduled poll picks up the new symbol.
    pub async fn select_symbol(&self, symbol: &str) -> PollOutcome {
        let previous = self.symbol();
        let params = self.dashboard.parameters().with("symbol", symbol);
        self.dashboard.configure(params);
        events::log_symbol_selected(&previous, symbol);
        self.dashboard.refresh().await
    }

    /// Reload one chart for `period` from the chart-data endpoint.
    ///
    /// The series is dispatched only if the backend reports success.
    /// Returns `None` when charts are off or `chart_id` has no sink.
    pub async fn select_chart_period(&self, chart_id: &str, period: &str) -> Option<PollOutcome> {
        let controller = self.chart_data.get(chart_id)?;
        controller.configure(QueryParams::new().with("period", period));
        events::log_chart_period_selected(chart_id, period);
        Some(controller.refresh().await)
    }

    /// Chart ids that accept a period reload.
    pub fn chart_ids(&self) -> impl Iterator<Item = &str> {
        self.chart_data.keys().map(String::as_str)
    }

    pub fn symbol(&self) -> String {
        self.dashboard
            .parameters()
            .get("symbol")
            .unwrap_or_default()
            .to_string()
    }

    pub fn charts_enabled(&self) -> bool {
        self.pnl_chart.is_some()
    }

    pub fn dashboard(&self) -> &Arc<PollingController<DashboardEndpoint>> {
        &self.dashboard
    }

    pub fn pnl_chart(&self) -> Option<&Arc<PollingController<PnlChartEndpoint>>> {
        self.pnl_chart.as_ref()
    }

    pub fn trading_stats(&self) -> Option<&Arc<PollingController<TradingStatsEndpoint>>> {
        self.trading_stats.as_ref()
    }

    async fn refresh_pnl_chart(&self) -> Option<PollOutcome> {
        match &self.pnl_chart {
            Some(pnl_chart) => Some(pnl_chart.refresh().await),
            None => None,
        }
    }

    async fn refresh_trading_stats(&self) -> Option<PollOutcome> {
        match &self.trading_stats {
            Some(trading_stats) => Some(trading_stats.refresh().await),
            None => None,
        }
    }
}

// Spawned polls can outlive the app and keep a controller alive
impl Drop for DashboardApp {
    fn drop(&mut self) {
        self.cancel_timers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::{FailureKind, FetchError};
    use crate::render::MemoryOutput;
    use crate::render::panels::{PERFORMANCE, PNL_CHART, POSITIONS};
    use crate::transport::RawResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers each endpoint with a canned body and records queries.
    #[derive(Default)]
    struct RoutingTransport {
        queries: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    #[async_trait]
    impl Transport for RoutingTransport {
        async fn get(
            &self,
            url: &str,
            query: &[(String, String)],
            _timeout: Duration,
        ) -> Result<RawResponse, FetchError> {
            self.queries
                .lock()
                .unwrap()
                .push((url.to_string(), query.to_vec()));
            let body = if url.ends_with("/api/bybit/dashboard-data") {
                r#"{"success": true, "data": {"positions": []}}"#
            } else if url.ends_with("/api/pnl-chart") {
                r#"{"status": "success", "data": {"labels": ["a"], "values": [1]}}"#
            } else if url.ends_with("/api/chart-data/pnl") {
                r#"{"status": "success", "data": {"labels": ["a", "b"], "values": [2, 9]}}"#
            } else if url.contains("/api/chart-data/") {
                r#"{"status": "error", "message": "Unknown chart"}"#
            } else {
                r#"{"status": "success", "data": {"win_rate": 50}}"#
            };
            Ok(RawResponse::ok(body))
        }
    }

    fn app(config: &VigilConfig) -> (DashboardApp, Arc<RoutingTransport>, Arc<MemoryOutput>) {
        let transport = Arc::new(RoutingTransport::default());
        let output = Arc::new(MemoryOutput::new());
        let app = DashboardApp::new(
            config,
            transport.clone(),
            DashboardSinkSet::panels(output.clone()),
        );
        (app, transport, output)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_loads_every_panel_then_runs_timers() {
        let (app, _transport, output) = app(&VigilConfig::default());

        assert!(app.start().await.is_success());

        assert_eq!(output.last(POSITIONS), Some(vec!["No open positions".to_string()]));
        assert_eq!(output.count(PNL_CHART), 1);
        assert_eq!(output.count(PERFORMANCE), 1);
        assert!(app.dashboard().is_periodic_running());
        assert!(app.pnl_chart().unwrap().is_periodic_running());

        app.stop();
        assert!(!app.dashboard().is_periodic_running());
        assert!(!app.trading_stats().unwrap().is_periodic_running());
    }

    #[tokio::test]
    async fn test_select_symbol_refreshes_with_new_symbol() {
        let (app, transport, _output) = app(&VigilConfig::default());
        assert_eq!(app.symbol(), "ETHUSDT");

        assert!(app.select_symbol("BTCUSDT").await.is_success());

        assert_eq!(app.symbol(), "BTCUSDT");
        let queries = transport.queries.lock().unwrap();
        let (url, query) = queries.last().unwrap();
        assert!(url.ends_with("/api/bybit/dashboard-data"));
        assert_eq!(query, &vec![("symbol".to_string(), "BTCUSDT".to_string())]);
    }

    #[tokio::test]
    async fn test_periodic_pnl_chart_poll_sends_no_period() {
        let (app, transport, _output) = app(&VigilConfig::default());

        app.refresh_charts().await;

        let queries = transport.queries.lock().unwrap();
        let (_, query) = queries
            .iter()
            .find(|(url, _)| url.ends_with("/api/pnl-chart"))
            .unwrap();
        assert!(query.is_empty());
    }

    #[tokio::test]
    async fn test_select_chart_period_reloads_from_chart_data() {
        let (app, transport, output) = app(&VigilConfig::default());

        assert!(app.select_chart_period("pnl", "7d").await.unwrap().is_success());

        let queries = transport.queries.lock().unwrap();
        let (url, query) = queries.last().unwrap();
        assert!(url.ends_with("/api/chart-data/pnl"));
        assert_eq!(query, &vec![("period".to_string(), "7d".to_string())]);
        assert_eq!(output.count(PNL_CHART), 1);
        assert_eq!(
            output.last(PNL_CHART).unwrap()[0],
            "Last $9.00 | High $9.00 | Low $2.00"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_chart_reload_leaves_chart_untouched() {
        let transport = Arc::new(RoutingTransport::default());
        let output = Arc::new(MemoryOutput::new());
        let sinks = DashboardSinkSet::panels(output.clone())
            .with_chart_series("performance", Arc::new(pnl_chart_panel(output.clone())));
        let app = DashboardApp::new(&VigilConfig::default(), transport, sinks);

        let outcome = app.select_chart_period("performance", "30d").await.unwrap();

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Application));
        assert_eq!(output.count(PNL_CHART), 0);
        assert_eq!(app.chart_ids().collect::<Vec<_>>(), vec!["performance", "pnl"]);
    }

    #[tokio::test]
    async fn test_unknown_chart_id_is_ignored() {
        let (app, transport, _output) = app(&VigilConfig::default());

        assert!(app.select_chart_period("volume", "7d").await.is_none());
        assert!(transport.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_charts_can_be_disabled() {
        let mut config = VigilConfig::default();
        config.charts.enabled = Some(false);
        let (app, transport, _output) = app(&config);

        assert!(!app.charts_enabled());
        let (pnl_chart, trading_stats) = app.refresh_charts().await;
        assert!(pnl_chart.is_none() && trading_stats.is_none());
        assert!(app.select_chart_period(PNL_CHART_ID, "7d").await.is_none());
        assert!(transport.queries.lock().unwrap().is_empty());
    }
}
