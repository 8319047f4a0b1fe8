//! Backend endpoints and the payloads they produce.
//!
//! An [`Endpoint`] names a path and knows how to turn a response body into
//! its typed payload, so the polling controller stays endpoint-agnostic.

pub mod envelope;
pub mod flex;
pub mod types;

use crate::poll::FetchError;
use types::{DashboardData, PnlSeries, TradingStats};

/// A backend resource polled by a [`crate::PollingController`].
pub trait Endpoint: Send + Sync + 'static {
    type Payload: Send + Sync + 'static;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Path appended to the base URL, starting with `/`.
    fn path(&self) -> &str;

    /// Turn a 2xx response body into the payload.
    ///
    /// Envelope-level failures must be reported as
    /// [`FetchError::Rejected`] and undecodable bodies as
    /// [`FetchError::Malformed`].
    fn decode(&self, url: &str, body: &[u8]) -> Result<Self::Payload, FetchError>;
}

/// `/api/bybit/dashboard-data?symbol=...`
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardEndpoint;

impl Endpoint for DashboardEndpoint {
    type Payload = DashboardData;

    fn name(&self) -> &'static str {
        "dashboard"
    }

    fn path(&self) -> &str {
        "/api/bybit/dashboard-data"
    }

    fn decode(&self, url: &str, body: &[u8]) -> Result<DashboardData, FetchError> {
        envelope::decode_success(url, body, "Failed to load Bybit data")
    }
}

/// `/api/pnl-chart`
#[derive(Debug, Clone, Copy, Default)]
pub struct PnlChartEndpoint;

impl Endpoint for PnlChartEndpoint {
    type Payload = PnlSeries;

    fn name(&self) -> &'static str {
        "pnl_chart"
    }

    fn path(&self) -> &str {
        "/api/pnl-chart"
    }

    fn decode(&self, url: &str, body: &[u8]) -> Result<PnlSeries, FetchError> {
        envelope::decode_status(url, body)
    }
}

/// `/api/chart-data/{chart_id}?period=...`
///
/// Reloads one chart's series for a chosen period. Any chart id the backend
/// knows is accepted; the answer has the same shape as the PnL chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartDataEndpoint {
    chart_id: String,
    path: String,
}

impl ChartDataEndpoint {
    pub fn new(chart_id: impl Into<String>) -> Self {
        let chart_id = chart_id.into();
        let path = format!("/api/chart-data/{}", chart_id);
        Self { chart_id, path }
    }

    pub fn chart_id(&self) -> &str {
        &self.chart_id
    }
}

impl Endpoint for ChartDataEndpoint {
    type Payload = PnlSeries;

    fn name(&self) -> &'static str {
        "chart_data"
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn decode(&self, url: &str, body: &[u8]) -> Result<PnlSeries, FetchError> {
        envelope::decode_status(url, body)
    }
}

/// `/api/trading-stats`
#[derive(Debug, Clone, Copy, Default)]
pub struct TradingStatsEndpoint;

impl Endpoint for TradingStatsEndpoint {
    type Payload = TradingStats;

    fn name(&self) -> &'static str {
        "trading_stats"
    }

    fn path(&self) -> &str {
        "/api/trading-stats"
    }

    fn decode(&self, url: &str, body: &[u8]) -> Result<TradingStats, FetchError> {
        envelope::decode_status(url, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::FailureKind;

    #[test]
    fn test_dashboard_endpoint_decodes_payload() {
        let body = br#"{"success": true, "data": {
            "account": {"total_balance": 1000.5},
            "positions": [],
            "recent_trades": []
        }}"#;

        let data = DashboardEndpoint.decode("u", body).unwrap();

        assert_eq!(data.account.unwrap().total_balance, Some(1000.5));
        assert_eq!(data.positions, Some(Vec::new()));
        assert!(data.market_data.is_none());
    }

    #[test]
    fn test_chart_endpoints_decode_status_envelopes() {
        let series = PnlChartEndpoint
            .decode(
                "u",
                br#"{"status": "success", "data": {"labels": ["09:00"], "values": [12.5]}}"#,
            )
            .unwrap();
        assert_eq!(series.labels, vec!["09:00".to_string()]);

        let stats = TradingStatsEndpoint
            .decode("u", br#"{"status": "success", "data": {"win_rate": "55.5"}}"#)
            .unwrap();
        assert_eq!(stats.win_rate, 55.5);
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(DashboardEndpoint.path(), "/api/bybit/dashboard-data");
        assert_eq!(PnlChartEndpoint.path(), "/api/pnl-chart");
        assert_eq!(TradingStatsEndpoint.path(), "/api/trading-stats");
        assert_eq!(ChartDataEndpoint::new("pnl").path(), "/api/chart-data/pnl");
        assert_eq!(
            ChartDataEndpoint::new("performance").path(),
            "/api/chart-data/performance"
        );
    }

    #[test]
    fn test_chart_data_applies_only_successful_status() {
        let endpoint = ChartDataEndpoint::new("pnl");

        let series = endpoint
            .decode(
                "u",
                br#"{"status": "success", "data": {"labels": ["a", "b"], "values": ["1.5", 3]}}"#,
            )
            .unwrap();
        assert_eq!(series.values, vec![1.5, 3.0]);

        let err = endpoint
            .decode("u", br#"{"status": "error", "message": "unknown chart"}"#)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Application);
    }
}
