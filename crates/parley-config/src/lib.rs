//! Parley configuration system.
//!
//! TOML-based configuration for the chat client. Every section uses serde
//! defaults, so an empty or partial file is a valid config.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use parley_config::{load_config, config_to_json};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use env::{apply_env_overrides, API_URL_ENV};
pub use schema::{ApiConfig, LogLevel, LoggingConfig, ParleyConfig, SessionConfig};

use std::path::Path;

use parley_common::ConfigError;

/// Load the effective config.
///
/// Reads `path` when given, otherwise the platform default file (created
/// from the template on first run). Environment overrides are applied last,
/// then the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<ParleyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            toml_loader::load_from_path(path)?
        }
        None => toml_loader::load_default()?,
    };

    apply_env_overrides(&mut config);
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &ParleyConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
