//! Interactive chat loop.
//!
//! Input is read on the main task. Everything the store reports back
//! (assistant replies, errors, resets) is printed by a separate renderer
//! task subscribed to the session's events, which also redraws the prompt
//! once the store settles.

use std::io::Write;
use std::sync::Arc;

use parley_client::{Role, SessionError, SessionEvent, SessionStore, ThreadId};
use parley_common::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use crate::commands::{self, render_history_line, render_reply};

const PROMPT: &str = "> ";

const HELP: &str = "\
/new          start a new conversation
/delete       delete this thread on the backend, then start a new one
/thread [ID]  show the current thread, or continue thread ID
/history      show this conversation
/tools        list backend tools
/tool NAME    show one tool
/dismiss      clear the last error
/help         show this help
/quit         exit";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SlashCommand {
    New,
    Delete,
    Thread(Option<String>),
    History,
    Tools,
    Tool(String),
    Dismiss,
    Help,
    Quit,
    Unknown(String),
}

impl SlashCommand {
    /// Parse an input line. Returns `None` for ordinary chat text.
    pub(crate) fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('/')?;
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("");
        let arg = parts
            .next()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Some(match (name, arg) {
            ("new", _) => SlashCommand::New,
            ("delete", _) => SlashCommand::Delete,
            ("thread", arg) => SlashCommand::Thread(arg),
            ("history", _) => SlashCommand::History,
            ("tools", _) => SlashCommand::Tools,
            ("tool", Some(name)) => SlashCommand::Tool(name),
            ("dismiss", _) => SlashCommand::Dismiss,
            ("help", _) => SlashCommand::Help,
            ("quit" | "exit", _) => SlashCommand::Quit,
            _ => SlashCommand::Unknown(line.to_string()),
        })
    }
}

pub async fn run(store: Arc<SessionStore>) -> Result<()> {
    let renderer = tokio::spawn(render_events(store.subscribe()));

    println!("thread {}  (/help for commands)", store.thread_id());
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt();
            continue;
        }

        let Some(command) = SlashCommand::parse(line) else {
            if let Err(SessionError::Busy) = store.send_message(line).await {
                println!("still waiting for the previous reply");
                prompt();
            }
            continue;
        };

        if command == SlashCommand::Quit {
            break;
        }
        if !handle(&store, command).await {
            prompt();
        }
    }

    renderer.abort();
    tracing::debug!("chat loop finished");
    Ok(())
}

/// Run one slash command. Returns true when the renderer will redraw the
/// prompt because the command published a session event.
async fn handle(store: &SessionStore, command: SlashCommand) -> bool {
    match command {
        SlashCommand::New => {
            store.clear_messages();
            true
        }
        // Success resets the session and failure records an error; both
        // are rendered from events.
        SlashCommand::Delete => {
            let _ = store.delete_thread().await;
            true
        }
        SlashCommand::Thread(None) => {
            println!("{}", store.thread_id());
            false
        }
        SlashCommand::Thread(Some(id)) => {
            let id = ThreadId::from_string(id);
            if store.thread_id() == id {
                println!("already on {id}");
                return false;
            }
            store.set_thread_id(id);
            true
        }
        SlashCommand::History => {
            for message in store.messages() {
                println!("{}", render_history_line(&message));
            }
            false
        }
        SlashCommand::Tools => {
            if let Err(e) = commands::tools(store.transport().as_ref(), None).await {
                println!("{e}");
            }
            false
        }
        SlashCommand::Tool(name) => {
            if let Err(e) = commands::tools(store.transport().as_ref(), Some(&name)).await {
                println!("{e}");
            }
            false
        }
        SlashCommand::Dismiss => {
            store.clear_error();
            false
        }
        SlashCommand::Help => {
            println!("{HELP}");
            false
        }
        SlashCommand::Unknown(line) => {
            println!("unknown command: {line}");
            false
        }
        SlashCommand::Quit => false,
    }
}

async fn render_events(mut events: broadcast::Receiver<SessionEvent>) {
    let mut sending = false;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("renderer skipped {n} session events");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            SessionEvent::LoadingChanged(loading) => {
                sending = loading;
                if !loading {
                    prompt();
                }
            }
            SessionEvent::MessageAppended(message) if message.role() == Role::Assistant => {
                println!("{}", render_reply(&message));
            }
            SessionEvent::MessageAppended(_) => {}
            SessionEvent::ErrorChanged(Some(text)) => {
                println!("error: {text}");
                if !sending {
                    prompt();
                }
            }
            SessionEvent::ErrorChanged(None) => {}
            SessionEvent::Reset(thread_id) => {
                println!("new conversation, thread {thread_id}");
                prompt();
            }
            SessionEvent::ThreadChanged(thread_id) => {
                println!("continuing thread {thread_id}");
                prompt();
            }
        }
    }
}

fn prompt() {
    print!("{PROMPT}");
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(SlashCommand::parse("hello /new"), None);
    }

    #[test]
    fn commands_parse() {
        assert_eq!(SlashCommand::parse("/new"), Some(SlashCommand::New));
        assert_eq!(SlashCommand::parse("/delete"), Some(SlashCommand::Delete));
        assert_eq!(SlashCommand::parse("/history"), Some(SlashCommand::History));
        assert_eq!(SlashCommand::parse("/dismiss"), Some(SlashCommand::Dismiss));
        assert_eq!(SlashCommand::parse("/exit"), Some(SlashCommand::Quit));
    }

    #[test]
    fn thread_argument_is_optional() {
        assert_eq!(
            SlashCommand::parse("/thread"),
            Some(SlashCommand::Thread(None))
        );
        assert_eq!(
            SlashCommand::parse("/thread   t-42 "),
            Some(SlashCommand::Thread(Some("t-42".into())))
        );
    }

    #[test]
    fn tool_needs_a_name() {
        assert_eq!(
            SlashCommand::parse("/tool arxiv"),
            Some(SlashCommand::Tool("arxiv".into()))
        );
        assert_eq!(
            SlashCommand::parse("/tool"),
            Some(SlashCommand::Unknown("/tool".into()))
        );
    }

    #[test]
    fn unknown_keeps_the_line() {
        assert_eq!(
            SlashCommand::parse("/frobnicate now"),
            Some(SlashCommand::Unknown("/frobnicate now".into()))
        );
    }
}
