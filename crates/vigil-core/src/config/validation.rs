//! Configuration validation.

use std::time::Duration;

use crate::config::types::VigilConfig;
use crate::errors::ConfigError;
use crate::poll::RetryPolicy;

/// Validate the merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidConfiguration`] naming the first offending key.
pub fn validate_config(config: &VigilConfig) -> Result<(), ConfigError> {
    validate_base_url(config.server.base_url())?;

    if config.dashboard.symbol().trim().is_empty() {
        return Err(invalid("dashboard.symbol must not be empty"));
    }
    if !is_valid_symbol(config.dashboard.symbol()) {
        return Err(invalid(&format!(
            "dashboard.symbol '{}' must be letters and digits only (e.g. ETHUSDT)",
            config.dashboard.symbol()
        )));
    }

    validate_interval("dashboard", config.dashboard.interval())?;
    validate_policy("dashboard", &config.dashboard.retry_policy())?;

    if config.dashboard.network_retry_delay().is_zero() {
        return Err(invalid("dashboard.network_retry_delay_ms must be greater than 0"));
    }

    validate_interval("charts", config.charts.interval())?;
    validate_policy("charts", &config.charts.retry_policy())?;

    Ok(())
}

/// Validate that a base URL parses and uses http or https.
pub fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(base_url)
        .map_err(|e| invalid(&format!("server.base_url '{}' is not a URL: {}", base_url, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(&format!(
            "server.base_url must use http or https, got '{}'",
            other
        ))),
    }
}

/// Whether `symbol` looks like an exchange pair such as `ETHUSDT`: 2 to 20
/// ASCII letters and digits with at least one letter.
pub fn is_valid_symbol(symbol: &str) -> bool {
    (2..=20).contains(&symbol.len())
        && symbol.chars().all(|c| c.is_ascii_alphanumeric())
        && symbol.chars().any(|c| c.is_ascii_alphabetic())
}

fn validate_interval(section: &str, interval: Duration) -> Result<(), ConfigError> {
    if interval.is_zero() {
        return Err(invalid(&format!(
            "{}.interval_secs must be greater than 0",
            section
        )));
    }
    Ok(())
}

fn validate_policy(section: &str, policy: &RetryPolicy) -> Result<(), ConfigError> {
    if policy.max_retries == 0 {
        return Err(invalid(&format!("{}.max_retries must be at least 1", section)));
    }
    if policy.timeout.is_zero() {
        return Err(invalid(&format!(
            "{}.timeout_ms must be greater than 0",
            section
        )));
    }
    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidConfiguration {
        message: message.to_string(),
    }
}
