//! Wire-format DTOs and their conversion into the client model.

use std::collections::BTreeMap;

use parley_common::{new_id, ThreadId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ChatReply, DeleteStatus, Role, ServiceStatus, ToolCall, ToolInfo, ToolsList, Turn};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequestBody<'a> {
    pub message: &'a str,
    pub thread_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseBody {
    thread_id: String,
    #[serde(default)]
    messages: Vec<TurnBody>,
    final_response: String,
}

#[derive(Debug, Deserialize)]
struct TurnBody {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallBody>>,
    #[serde(default)]
    tool_call_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolCallBody {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default, alias = "input")]
    args: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    status: String,
    #[serde(flatten)]
    details: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteBody {
    status: String,
    #[serde(default)]
    thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolInfoBody {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    requires_api_key: bool,
    #[serde(default = "default_available")]
    is_available: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolsBody {
    tools: Vec<ToolInfoBody>,
    #[serde(default)]
    total: Option<usize>,
}

fn default_available() -> bool {
    true
}

impl From<ChatResponseBody> for ChatReply {
    fn from(body: ChatResponseBody) -> Self {
        let turns = body
            .messages
            .into_iter()
            .filter_map(|turn| {
                let role = match turn.role.parse::<Role>() {
                    Ok(role) => role,
                    Err(e) => {
                        debug!("skipping backend turn: {e}");
                        return None;
                    }
                };
                Some(Turn {
                    role,
                    content: turn.content,
                    tool_calls: turn
                        .tool_calls
                        .unwrap_or_default()
                        .into_iter()
                        .map(ToolCall::from)
                        .collect(),
                    tool_call_id: turn.tool_call_id,
                })
            })
            .collect();

        ChatReply {
            thread_id: ThreadId::from_string(body.thread_id),
            turns,
            final_response: body.final_response,
        }
    }
}

impl From<ToolCallBody> for ToolCall {
    fn from(body: ToolCallBody) -> Self {
        ToolCall {
            id: body.id.unwrap_or_else(new_id),
            name: body.name,
            input: body.args,
            output: None,
        }
    }
}

impl From<StatusBody> for ServiceStatus {
    fn from(body: StatusBody) -> Self {
        ServiceStatus {
            status: body.status,
            details: body.details,
        }
    }
}

impl From<DeleteBody> for DeleteStatus {
    fn from(body: DeleteBody) -> Self {
        DeleteStatus {
            status: body.status,
            thread_id: body.thread_id.map(ThreadId::from_string),
        }
    }
}

impl From<ToolInfoBody> for ToolInfo {
    fn from(body: ToolInfoBody) -> Self {
        ToolInfo {
            name: body.name,
            description: body.description,
            requires_api_key: body.requires_api_key,
            is_available: body.is_available,
        }
    }
}

impl From<ToolsBody> for ToolsList {
    fn from(body: ToolsBody) -> Self {
        let tools: Vec<ToolInfo> = body.tools.into_iter().map(ToolInfo::from).collect();
        ToolsList {
            total: body.total.unwrap_or(tools.len()),
            tools,
        }
    }
}
