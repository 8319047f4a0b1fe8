//! vigil-core: Core library for resilient trading dashboard polling
//!
//! This library polls a trading backend's HTTP API on a timer, survives
//! slow or failing requests, and hands each fresh payload to independent
//! render sinks. It is used by the `vigil` CLI.
//!
//! # Main Entry Points
//!
//! - [`poll`] - Polling controller, retry loop and outcomes
//! - [`api`] - Endpoint adapters and payload types
//! - [`sinks`] - Render and error sink interfaces plus dispatch
//! - [`render`] - Text panels and number formatting
//! - [`app`] - Dashboard root that owns all controllers
//! - [`config`] - Configuration management

pub mod api;
pub mod app;
pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod poll;
pub mod render;
pub mod sinks;
pub mod transport;

// Re-export commonly used types at crate root for convenience
pub use api::types::{
    AccountSnapshot, DashboardData, MarketData, PnlSeries, PnlSummary, Position, Side,
    TradingStats, Trade,
};
pub use api::{
    ChartDataEndpoint, DashboardEndpoint, Endpoint, PnlChartEndpoint, TradingStatsEndpoint,
};
pub use app::{DashboardApp, DashboardSinkSet, PNL_CHART_ID};
pub use config::VigilConfig;
pub use errors::{ConfigError, VigilError, VigilResult};
pub use poll::{
    FailureKind, FetchError, PollError, PollOutcome, PollRequest, PollingController,
    QueryParams, RetryPolicy,
};
pub use sinks::{DashboardSinks, DispatchReport, ErrorSink, RenderSink, SinkError};
pub use transport::{HttpTransport, RawResponse, Transport};

// Re-export logging initialization
pub use logging::init_logging;
