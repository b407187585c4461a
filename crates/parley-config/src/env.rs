//! Environment-variable overrides applied on top of the file config.

use tracing::info;

use crate::schema::ParleyConfig;

/// Overrides `api.base_url`.
pub const API_URL_ENV: &str = "PARLEY_API_URL";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut ParleyConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides using `lookup` as the variable source.
///
/// Empty values are ignored so an exported-but-blank variable does not
/// wipe out the configured URL.
pub fn apply_overrides_from(config: &mut ParleyConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(API_URL_ENV) {
        let url = url.trim();
        if !url.is_empty() {
            info!("{API_URL_ENV} overrides api.base_url");
            config.api.base_url = url.to_string();
        }
    }
}
