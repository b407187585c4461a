use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parley: a terminal client for a tool-using research chat backend.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8000/api.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log filter override (debug, info, warn, error, or an EnvFilter directive).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive conversation (default).
    Chat {
        /// Continue an existing backend thread.
        #[arg(long)]
        thread: Option<String>,
    },
    /// Send a single message and print the reply.
    Ask {
        message: String,
        #[arg(long)]
        thread: Option<String>,
    },
    /// Backend liveness.
    Health,
    /// Backend readiness, including which upstream keys are configured.
    Ready,
    /// List tools, or show one by name.
    Tools { name: Option<String> },
    /// Delete a thread's stored context on the backend.
    Delete { thread_id: String },
    /// Print the effective configuration as JSON.
    Config,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Chat { thread: None })
    }
}

pub fn parse() -> Args {
    Args::parse()
}
