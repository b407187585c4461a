//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Parley Configuration
# Only override what you want to change -- missing fields use defaults.

[api]
# base_url = "http://localhost:8000/api"   # overridden by PARLEY_API_URL
# request_timeout_secs = 120               # 1-600
# connect_timeout_secs = 10                # 1-60

[session]
# event_capacity = 64                      # 1-4096

[logging]
# level = "INFO"                           # DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
