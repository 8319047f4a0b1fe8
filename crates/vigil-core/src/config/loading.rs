//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.vigil/config.toml` (global user preferences)
//! 3. **Project config** - `./.vigil/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority, applied by the CLI)

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::types::{
    ChartsConfig, DashboardConfig, PollingSettings, ServerConfig, VigilConfig,
};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;

const CONFIG_DIR: &str = ".vigil";
const CONFIG_FILE: &str = "config.toml";

/// Load configuration from the hierarchy of config files.
///
/// Loads and merges configuration from:
/// 1. Default values
/// 2. User config (`~/.vigil/config.toml`)
/// 3. Project config (`./.vigil/config.toml`)
///
/// # Errors
///
/// Returns an error if a present file cannot be parsed or the merged result
/// fails validation. Missing config files are not errors.
pub fn load_hierarchy() -> Result<VigilConfig, ConfigError> {
    let user_path = user_config_path();
    let project_path = project_config_path()?;
    load_from_paths(user_path.as_deref(), Some(&project_path))
}

/// Load and merge the given user and project config files.
pub fn load_from_paths(
    user_path: Option<&Path>,
    project_path: Option<&Path>,
) -> Result<VigilConfig, ConfigError> {
    let mut config = VigilConfig::default();

    for path in [user_path, project_path].into_iter().flatten() {
        match load_config_file(path) {
            Ok(file_config) => config = merge_configs(config, file_config),
            Err(ConfigError::ConfigNotFound { path: missing }) => {
                debug!(event = "core.config.file_not_found", path = %missing);
            }
            Err(e) => return Err(e),
        }
    }

    validate_config(&config)?;

    Ok(config)
}

/// Load a configuration file from the given path.
pub fn load_config_file(path: &Path) -> Result<VigilConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::ConfigNotFound {
                path: path.display().to_string(),
            }
        } else {
            ConfigError::IoError { source: e }
        }
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Path of the user-level config file, if a home directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Path of the project-level config file under the current directory.
pub fn project_config_path() -> Result<PathBuf, ConfigError> {
    Ok(std::env::current_dir()?.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Merge two configurations, with override_config taking precedence.
///
/// Every leaf is optional, so override values replace base values only if present.
pub fn merge_configs(base: VigilConfig, override_config: VigilConfig) -> VigilConfig {
    VigilConfig {
        server: ServerConfig {
            base_url: override_config.server.base_url.or(base.server.base_url),
        },
        dashboard: DashboardConfig {
            symbol: override_config.dashboard.symbol.or(base.dashboard.symbol),
            polling: merge_polling(base.dashboard.polling, override_config.dashboard.polling),
            network_retry_delay_ms: override_config
                .dashboard
                .network_retry_delay_ms
                .or(base.dashboard.network_retry_delay_ms),
        },
        charts: ChartsConfig {
            enabled: override_config.charts.enabled.or(base.charts.enabled),
            polling: merge_polling(base.charts.polling, override_config.charts.polling),
        },
    }
}

fn merge_polling(base: PollingSettings, override_settings: PollingSettings) -> PollingSettings {
    PollingSettings {
        interval_secs: override_settings.interval_secs.or(base.interval_secs),
        timeout_ms: override_settings.timeout_ms.or(base.timeout_ms),
        max_retries: override_settings.max_retries.or(base.max_retries),
        retry_delay_ms: override_settings.retry_delay_ms.or(base.retry_delay_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_hierarchy_integration() {
        let temp_dir = tempfile::tempdir().unwrap();
        let user_path = temp_dir.path().join("user.toml");
        let project_path = temp_dir.path().join("project.toml");

        fs::write(
            &user_path,
            r#"
[server]
base_url = "http://10.0.0.5:5000"

[dashboard]
symbol = "BTCUSDT"
timeout_ms = 8000

[charts]
enabled = false
"#,
        )
        .unwrap();

        fs::write(
            &project_path,
            r#"
[dashboard]
symbol = "SOLUSDT"
max_retries = 5
"#,
        )
        .unwrap();

        let merged = load_from_paths(Some(&user_path), Some(&project_path)).unwrap();
        assert_eq!(merged.server.base_url(), "http://10.0.0.5:5000"); // From user
        assert_eq!(merged.dashboard.symbol(), "SOLUSDT"); // Overridden by project
        assert_eq!(merged.dashboard.polling.timeout_ms, Some(8000)); // From user
        assert_eq!(merged.dashboard.polling.max_retries, Some(5)); // From project
        assert!(!merged.charts.enabled()); // Not overridden by project's absence
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope.toml");

        let config = load_from_paths(Some(&missing), None).unwrap();
        assert_eq!(config, VigilConfig::default());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[dashboard\nsymbol = ").unwrap();

        let err = load_from_paths(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_invalid_merged_config_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[dashboard]\nmax_retries = 0\n").unwrap();

        let err = load_from_paths(None, Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_toml_parsing_edge_cases() {
        let empty_config: VigilConfig = toml::from_str("").unwrap();
        assert_eq!(empty_config.dashboard.symbol(), "ETHUSDT");
        assert_eq!(empty_config.server.base_url(), "http://127.0.0.1:5000");

        let partial: VigilConfig = toml::from_str("[charts]\nenabled = false\n").unwrap();
        assert!(!partial.charts.enabled());
        assert_eq!(partial.dashboard.polling, PollingSettings::default());
    }
}
