use clap::ArgMatches;
use tracing::{error, info};

use vigil_core::config::loading::merge_configs;
use vigil_core::config::{ChartsConfig, DashboardConfig, PollingSettings, ServerConfig};
use vigil_core::{VigilConfig, VigilError};

/// Config values given on the command line. Flags a subcommand does not
/// define are simply absent.
pub fn cli_overrides(matches: &ArgMatches) -> VigilConfig {
    let string_arg = |name: &str| {
        matches
            .try_get_one::<String>(name)
            .ok()
            .flatten()
            .cloned()
    };
    let no_charts = matches
        .try_get_one::<bool>("no-charts")
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false);

    VigilConfig {
        server: ServerConfig {
            base_url: string_arg("base-url"),
        },
        dashboard: DashboardConfig {
            symbol: string_arg("symbol").map(|s| s.trim().to_uppercase()),
            polling: PollingSettings {
                interval_secs: matches.try_get_one::<u64>("interval").ok().flatten().copied(),
                ..PollingSettings::default()
            },
            network_retry_delay_ms: None,
        },
        charts: ChartsConfig {
            enabled: no_charts.then_some(false),
            ..ChartsConfig::default()
        },
    }
}

/// Load the config hierarchy, apply CLI overrides and validate the result.
pub fn load_config(matches: &ArgMatches) -> Result<VigilConfig, Box<dyn std::error::Error>> {
    let config = merge_configs(VigilConfig::load_hierarchy()?, cli_overrides(matches));

    if let Err(e) = config.validate() {
        error!(
            event = "cli.config_invalid",
            error = %e,
            error_code = e.error_code()
        );
        return Err(e.into());
    }

    info!(
        event = "cli.config_loaded",
        base_url = config.server.base_url(),
        symbol = config.dashboard.symbol()
    );
    Ok(config)
}

/// Single-threaded runtime; one logical thread drives every poller.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
