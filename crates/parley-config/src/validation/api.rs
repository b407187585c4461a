//! Validation for the `[api]` section.

use url::Url;

use crate::schema::ParleyConfig;

use super::helpers::validate_range;

pub(crate) fn validate_api(errors: &mut Vec<String>, config: &ParleyConfig) {
    validate_base_url(errors, &config.api.base_url);
    validate_range(
        errors,
        "api.request_timeout_secs",
        config.api.request_timeout_secs,
        1,
        600,
    );
    validate_range(
        errors,
        "api.connect_timeout_secs",
        config.api.connect_timeout_secs,
        1,
        60,
    );
}

/// The base URL must be absolute `http`/`https` with a host.
fn validate_base_url(errors: &mut Vec<String>, base_url: &str) {
    let parsed = match Url::parse(base_url) {
        Ok(parsed) => parsed,
        Err(e) => {
            errors.push(format!("api.base_url = {base_url:?} is not a valid URL: {e}"));
            return;
        }
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        errors.push(format!(
            "api.base_url = {base_url:?} must use http or https, not {}",
            parsed.scheme()
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        errors.push(format!("api.base_url = {base_url:?} has no host"));
    }
}
