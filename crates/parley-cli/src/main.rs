mod cli;
mod commands;
mod repl;

use std::process::ExitCode;
use std::sync::Arc;

use parley_client::{HttpTransport, SessionStore, ThreadId, TransportConfig};
use parley_common::{ConfigError, ParleyError};
use parley_config::{ApiConfig, LogLevel, ParleyConfig};
use tracing_subscriber::EnvFilter;

use cli::Command;

/// Flag first, then `RUST_LOG`, then the config file's level.
fn init_logging(flag: Option<&str>, configured: LogLevel) {
    let fallback = || EnvFilter::new(configured.as_directive());
    let filter = match flag {
        Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| fallback()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config, falling back to defaults (plus environment overrides)
/// when the file is missing or invalid. The error is returned for logging
/// once the subscriber is up.
fn load_config(args: &cli::Args) -> (ParleyConfig, Option<ConfigError>) {
    match parley_config::load_config(args.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => {
            let mut config = ParleyConfig::default();
            parley_config::apply_env_overrides(&mut config);
            (config, Some(e))
        }
    }
}

fn transport_config(api: &ApiConfig, api_url: Option<&str>) -> TransportConfig {
    TransportConfig::new(api_url.unwrap_or(&api.base_url))
        .with_request_timeout(api.request_timeout())
        .with_connect_timeout(api.connect_timeout())
}

async fn run(args: cli::Args, config: ParleyConfig) -> parley_common::Result<()> {
    let command = args.command();
    if command == Command::Config {
        commands::show_config(&config);
        return Ok(());
    }

    let transport = transport_config(&config.api, args.api_url.as_deref());
    tracing::debug!(base_url = %transport.base_url, "connecting");
    let transport = Arc::new(HttpTransport::new(transport).map_err(commands::transport_error)?);

    let new_store = |thread: Option<String>| {
        let store = SessionStore::new(transport.clone())
            .with_event_capacity(config.session.event_capacity as usize);
        if let Some(thread) = thread {
            store.set_thread_id(ThreadId::from_string(thread));
        }
        store
    };

    match command {
        Command::Chat { thread } => repl::run(Arc::new(new_store(thread))).await,
        Command::Ask { message, thread } => commands::ask(&new_store(thread), &message).await,
        Command::Health => commands::health(transport.as_ref()).await,
        Command::Ready => commands::ready(transport.as_ref()).await,
        Command::Tools { name } => commands::tools(transport.as_ref(), name.as_deref()).await,
        Command::Delete { thread_id } => commands::delete(transport.as_ref(), &thread_id).await,
        Command::Config => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    let (config, config_error) = load_config(&args);

    init_logging(args.log_level.as_deref(), config.logging.level);
    if let Some(e) = config_error {
        tracing::warn!("Config load failed, using defaults: {e}");
    }
    tracing::debug!("Parley v{} starting", env!("CARGO_PKG_VERSION"));

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let text = match e {
                ParleyError::Transport(text) | ParleyError::Session(text) => text,
                other => other.to_string(),
            };
            eprintln!("parley: {text}");
            ExitCode::FAILURE
        }
    }
}
