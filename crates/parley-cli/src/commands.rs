//! One-shot subcommands and the text rendering shared with the chat loop.

use parley_client::{
    ChatTransport, Message, SendOutcome, ServiceStatus, SessionStore, ThreadId, ToolCall,
    ToolInfo, ToolsList, TransportError,
};
use parley_common::{ParleyError, Result};
use parley_config::ParleyConfig;

pub(crate) fn transport_error(e: TransportError) -> ParleyError {
    ParleyError::Transport(e.to_string())
}

pub async fn health(transport: &dyn ChatTransport) -> Result<()> {
    let status = transport.health().await.map_err(transport_error)?;
    println!("{}", render_status(&status));
    Ok(())
}

pub async fn ready(transport: &dyn ChatTransport) -> Result<()> {
    let status = transport.ready().await.map_err(transport_error)?;
    println!("{}", render_status(&status));
    Ok(())
}

pub async fn tools(transport: &dyn ChatTransport, name: Option<&str>) -> Result<()> {
    match name {
        Some(name) => {
            let tool = transport.get_tool(name).await.map_err(transport_error)?;
            println!("{}", render_tool(&tool));
        }
        None => {
            let list = transport.list_tools().await.map_err(transport_error)?;
            println!("{}", render_tools(&list));
        }
    }
    Ok(())
}

pub async fn delete(transport: &dyn ChatTransport, thread_id: &str) -> Result<()> {
    let thread_id = ThreadId::from_string(thread_id);
    let status = transport
        .delete_thread(&thread_id)
        .await
        .map_err(transport_error)?;
    println!("{} {}", status.status, thread_id);
    Ok(())
}

/// One turn through a session store. Failures become the process error.
pub async fn ask(store: &SessionStore, message: &str) -> Result<()> {
    let outcome = store
        .send_message(message)
        .await
        .map_err(|e| ParleyError::Session(e.to_string()))?;

    match outcome {
        SendOutcome::Replied(reply) => {
            println!("{}", render_reply(&reply));
            Ok(())
        }
        SendOutcome::Failed(text) => Err(ParleyError::Transport(text)),
        SendOutcome::Discarded => Err(ParleyError::Session("reply discarded".into())),
    }
}

pub fn show_config(config: &ParleyConfig) {
    println!("{}", parley_config::config_to_json(config));
}

// ============================================================================
// Rendering
// ============================================================================

pub(crate) fn render_status(status: &ServiceStatus) -> String {
    let mut out = status.status.clone();
    for (key, value) in &status.details {
        out.push_str(&format!("\n  {key}: {value}"));
    }
    out
}

pub(crate) fn render_tool(tool: &ToolInfo) -> String {
    let mut flags = Vec::new();
    if tool.requires_api_key {
        flags.push("needs key");
    }
    if !tool.is_available {
        flags.push("unavailable");
    }
    let suffix = if flags.is_empty() {
        String::new()
    } else {
        format!(" ({})", flags.join(", "))
    };
    format!("{}{suffix}: {}", tool.name, tool.description)
}

pub(crate) fn render_tools(list: &ToolsList) -> String {
    let mut lines: Vec<String> = list.tools.iter().map(render_tool).collect();
    lines.push(format!("{} tools", list.total));
    lines.join("\n")
}

pub(crate) fn render_tool_call(call: &ToolCall) -> String {
    let input = serde_json::Value::Object(call.input.clone());
    match &call.output {
        Some(output) => format!("[{}] {input} -> {}", call.name, first_line(output)),
        None => format!("[{}] {input}", call.name),
    }
}

/// Assistant text, preceded by any tool calls made to produce it.
pub(crate) fn render_reply(message: &Message) -> String {
    let mut lines: Vec<String> = message.tool_calls().iter().map(render_tool_call).collect();
    lines.push(message.content().to_string());
    lines.join("\n")
}

pub(crate) fn render_history_line(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.timestamp().format("%H:%M:%S"),
        message.role().as_str(),
        message.content()
    )
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn arxiv(requires_api_key: bool, is_available: bool) -> ToolInfo {
        ToolInfo {
            name: "arxiv".into(),
            description: "Search ArXiv for preprints".into(),
            requires_api_key,
            is_available,
        }
    }

    #[test]
    fn status_lists_details() {
        let mut details = BTreeMap::new();
        details.insert("openai_configured".to_string(), serde_json::json!(true));
        let text = render_status(&ServiceStatus {
            status: "ready".into(),
            details,
        });
        assert_eq!(text, "ready\n  openai_configured: true");
    }

    #[test]
    fn tool_flags() {
        assert_eq!(
            render_tool(&arxiv(false, true)),
            "arxiv: Search ArXiv for preprints"
        );
        assert_eq!(
            render_tool(&arxiv(true, false)),
            "arxiv (needs key, unavailable): Search ArXiv for preprints"
        );
    }

    #[test]
    fn tools_footer_has_total() {
        let list = ToolsList {
            tools: vec![arxiv(false, true)],
            total: 1,
        };
        assert!(render_tools(&list).ends_with("1 tools"));
    }

    #[test]
    fn reply_shows_tool_calls_first() {
        let mut input = serde_json::Map::new();
        input.insert("query".into(), serde_json::json!("llm"));
        let message = Message::assistant(
            "Found two.",
            vec![ToolCall {
                id: "c1".into(),
                name: "arxiv".into(),
                input,
                output: Some("2 results\nmore".into()),
            }],
        );
        assert_eq!(
            render_reply(&message),
            "[arxiv] {\"query\":\"llm\"} -> 2 results\nFound two."
        );
    }

    #[test]
    fn history_line_has_role() {
        let line = render_history_line(&Message::user("Hello"));
        assert!(line.ends_with("user: Hello"));
    }

    #[test]
    fn transport_errors_keep_their_text() {
        let err = transport_error(TransportError::api(404, Some("Tool 'x' not found".into())));
        assert_eq!(err.to_string(), "transport error: Tool 'x' not found");
    }
}
