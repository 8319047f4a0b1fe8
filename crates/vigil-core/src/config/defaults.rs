//! Default values and resolved accessors for configuration types.
//!
//! Config structs keep `Option` fields so merging can tell "unset" from
//! "set to the default". The accessors here resolve them against built-in
//! defaults, which differ between the dashboard and chart pollers.

use std::time::Duration;

use crate::config::types::{
    ChartsConfig, DashboardConfig, PollingSettings, ServerConfig, VigilConfig,
};
use crate::poll::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_SYMBOL: &str = "ETHUSDT";

/// Built-in values for one poller section.
#[derive(Debug, Clone, Copy)]
struct PollingDefaults {
    interval_secs: u64,
    timeout_ms: u64,
    max_retries: u32,
    retry_delay_ms: u64,
}

const DASHBOARD_DEFAULTS: PollingDefaults = PollingDefaults {
    interval_secs: 10,
    timeout_ms: 15_000,
    max_retries: 3,
    retry_delay_ms: 1_000,
};

const CHART_DEFAULTS: PollingDefaults = PollingDefaults {
    interval_secs: 10,
    timeout_ms: 10_000,
    max_retries: 3,
    retry_delay_ms: 1_000,
};

const DEFAULT_NETWORK_RETRY_DELAY_MS: u64 = 5_000;

impl PollingSettings {
    fn interval(&self, defaults: PollingDefaults) -> Duration {
        Duration::from_secs(self.interval_secs.unwrap_or(defaults.interval_secs))
    }

    fn resolved(&self, defaults: PollingDefaults) -> PollingSettings {
        PollingSettings {
            interval_secs: Some(self.interval_secs.unwrap_or(defaults.interval_secs)),
            timeout_ms: Some(self.timeout_ms.unwrap_or(defaults.timeout_ms)),
            max_retries: Some(self.max_retries.unwrap_or(defaults.max_retries)),
            retry_delay_ms: Some(self.retry_delay_ms.unwrap_or(defaults.retry_delay_ms)),
        }
    }

    fn retry_policy(&self, defaults: PollingDefaults) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(self.timeout_ms.unwrap_or(defaults.timeout_ms)),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            base_delay: Duration::from_millis(
                self.retry_delay_ms.unwrap_or(defaults.retry_delay_ms),
            ),
        }
    }
}

impl ServerConfig {
    /// Returns the backend base URL, defaulting to the local dashboard server.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

impl DashboardConfig {
    /// Returns the selected symbol, defaulting to ETHUSDT.
    pub fn symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or(DEFAULT_SYMBOL)
    }

    /// Returns the periodic poll interval, defaulting to 10 seconds.
    pub fn interval(&self) -> Duration {
        self.polling.interval(DASHBOARD_DEFAULTS)
    }

    /// Returns the retry policy, defaulting to 3 attempts with a 15s deadline.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.polling.retry_policy(DASHBOARD_DEFAULTS)
    }

    /// Returns the delay before the extra poll after a network failure.
    pub fn network_retry_delay(&self) -> Duration {
        Duration::from_millis(
            self.network_retry_delay_ms
                .unwrap_or(DEFAULT_NETWORK_RETRY_DELAY_MS),
        )
    }
}

impl ChartsConfig {
    /// Returns whether chart pollers run, defaulting to true.
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Returns the periodic poll interval, defaulting to 10 seconds.
    pub fn interval(&self) -> Duration {
        self.polling.interval(CHART_DEFAULTS)
    }

    /// Returns the retry policy, defaulting to 3 attempts with a 10s deadline.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.polling.retry_policy(CHART_DEFAULTS)
    }
}

impl VigilConfig {
    /// Copy with every unset field filled in from the built-in defaults.
    pub fn resolved(&self) -> VigilConfig {
        VigilConfig {
            server: ServerConfig {
                base_url: Some(self.server.base_url().to_string()),
            },
            dashboard: DashboardConfig {
                symbol: Some(self.dashboard.symbol().to_string()),
                polling: self.dashboard.polling.resolved(DASHBOARD_DEFAULTS),
                network_retry_delay_ms: Some(
                    self.dashboard
                        .network_retry_delay_ms
                        .unwrap_or(DEFAULT_NETWORK_RETRY_DELAY_MS),
                ),
            },
            charts: ChartsConfig {
                enabled: Some(self.charts.enabled()),
                polling: self.charts.polling.resolved(CHART_DEFAULTS),
            },
        }
    }
}
