//! # Configuration System
//!
//! Hierarchical TOML configuration system for Vigil.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.vigil/config.toml` (global user preferences)
//! 3. **Project config** - `./.vigil/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Usage Example
//!
//! ```toml
//! # ~/.vigil/config.toml
//! [server]
//! base_url = "http://dashboard.local:5000"
//!
//! [dashboard]
//! symbol = "BTCUSDT"
//! max_retries = 5
//!
//! [charts]
//! enabled = false
//! ```
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use vigil_core::config::VigilConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VigilConfig::load_hierarchy()?;
//!     let policy = config.dashboard.retry_policy();
//!     println!("{} attempts per poll", policy.max_retries);
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

// Public API exports
pub use types::{ChartsConfig, DashboardConfig, PollingSettings, ServerConfig, VigilConfig};
pub use validation::{is_valid_symbol, validate_config};

impl VigilConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}
