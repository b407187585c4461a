//! Full configuration validation.
//!
//! Each section has its own checker; this orchestrator calls them all and
//! collects errors into a single `ConfigError`.

mod api;
mod helpers;


use crate::schema::ParleyConfig;
use parley_common::ConfigError;

use helpers::validate_range;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ParleyConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    api::validate_api(&mut errors, config);
    validate_range(
        &mut errors,
        "session.event_capacity",
        config.session.event_capacity,
        1,
        4096,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
