//! Lifecycle events shared by the library and the CLI.

use tracing::{error, info};

pub fn log_app_startup() {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION")
    );
}

pub fn log_app_shutdown() {
    info!(event = "core.app.shutdown_started");
}

pub fn log_app_error(error: &dyn std::error::Error) {
    error!(
        event = "core.app.error_occurred",
        error = %error,
        error_type = std::any::type_name_of_val(error)
    );
}

pub fn log_dashboard_started(base_url: &str, symbol: &str, charts: bool) {
    info!(
        event = "core.dashboard.started",
        base_url = base_url,
        symbol = symbol,
        charts = charts
    );
}

pub fn log_dashboard_stopped() {
    info!(event = "core.dashboard.stopped");
}

pub fn log_symbol_selected(previous: &str, symbol: &str) {
    info!(
        event = "core.dashboard.symbol_selected",
        previous = previous,
        symbol = symbol
    );
}

pub fn log_chart_period_selected(chart_id: &str, period: &str) {
    info!(
        event = "core.dashboard.chart_period_selected",
        chart_id = chart_id,
        period = period
    );
}
