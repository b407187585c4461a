//! Reading a config file, or the per-user default one.

use std::path::Path;

use parley_common::ConfigError;
use tracing::{debug, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::ParleyConfig;
use crate::validation;

/// Parse one TOML file. Absent keys take their defaults.
///
/// Out-of-range values are reported with a warning but still returned;
/// rejecting them is `load_config`'s job.
pub fn load_from_path(path: &Path) -> Result<ParleyConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ParseError(format!("cannot read {}: {e}", path.display()))
    })?;
    let config: ParleyConfig = toml::from_str(&text).map_err(|e| {
        ConfigError::ParseError(format!("{} is not valid config TOML: {e}", path.display()))
    })?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "{e}");
    }
    debug!(path = %path.display(), "config read");
    Ok(config)
}

/// Read `parley/config.toml` under the user's config directory, writing the
/// commented template there first if nothing exists yet.
pub fn load_default() -> Result<ParleyConfig, ConfigError> {
    let path = default_config_path()?;
    if path.exists() {
        return load_from_path(&path);
    }

    create_default_config(&path)?;
    Ok(ParleyConfig::default())
}
