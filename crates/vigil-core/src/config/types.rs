//! Configuration type definitions for Vigil.
//!
//! These types are serialized/deserialized from TOML config files.
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! base_url = "http://127.0.0.1:5000"
//!
//! [dashboard]
//! symbol = "BTCUSDT"
//! interval_secs = 10
//! timeout_ms = 15000
//! max_retries = 3
//!
//! [charts]
//! enabled = true
//! interval_secs = 30
//! ```

use serde::{Deserialize, Serialize};

/// Main configuration loaded from TOML config files.
///
/// This is the primary configuration structure that gets loaded from:
/// 1. User config: `~/.vigil/config.toml`
/// 2. Project config: `./.vigil/config.toml`
///
/// Project config values override user config values.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VigilConfig {
    /// Backend connection settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Primary dashboard-data poller
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// PnL chart and trading stats pollers
    #[serde(default)]
    pub charts: ChartsConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServerConfig {
    /// Base URL of the dashboard backend.
    /// Default: http://127.0.0.1:5000
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Settings for the dashboard-data poller.
///
/// Every field is optional so that a project config can override a single
/// value without restating the rest of the user config.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DashboardConfig {
    /// Trading symbol sent as the `symbol` query parameter.
    /// Default: ETHUSDT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(flatten)]
    pub polling: PollingSettings,

    /// Delay before the single extra poll scheduled after a network failure.
    /// Default: 5000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_retry_delay_ms: Option<u64>,
}

/// Settings for the chart pollers.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ChartsConfig {
    /// Whether chart pollers run alongside the dashboard poller.
    /// Default: true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(flatten)]
    pub polling: PollingSettings,
}

/// Cadence, deadline and retry settings shared by every poller section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PollingSettings {
    /// Seconds between periodic polls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,

    /// Deadline for a single request attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Total attempts per poll before the failure is surfaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Base delay of the linear backoff between attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
}
