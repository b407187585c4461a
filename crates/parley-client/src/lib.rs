//! Chat client for Parley.
//!
//! Provides the conversation session layer on top of a remote chat backend:
//! - `ChatTransport`: one request/response exchange per call, every outcome
//!   normalised into `TransportResult`
//! - `HttpTransport`: the JSON-over-HTTP implementation
//! - `SessionStore`: owned conversation state (history, thread identity,
//!   loading flag, last error) with an event stream for observers

pub mod http;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use http::{HttpTransport, TransportConfig};
pub use parley_common::{MessageId, ThreadId};
pub use session::{SendOutcome, SessionError, SessionEvent, SessionSnapshot, SessionStore};

pub type TransportResult<T> = Result<T, TransportError>;

/// The backend surface the session layer depends on.
///
/// Implementations never panic and never leak transport-specific error
/// types: every failure arrives as a `TransportError`, whose `Display` is
/// the text shown to the user.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn health(&self) -> TransportResult<ServiceStatus>;

    async fn ready(&self) -> TransportResult<ServiceStatus>;

    /// Send one user turn within the backend conversation `thread_id`.
    async fn send_chat(&self, message: &str, thread_id: &ThreadId) -> TransportResult<ChatReply>;

    /// Best-effort removal of the backend's stored context for `thread_id`.
    async fn delete_thread(&self, thread_id: &ThreadId) -> TransportResult<DeleteStatus>;

    async fn list_tools(&self) -> TransportResult<ToolsList>;

    async fn get_tool(&self, name: &str) -> TransportResult<ToolInfo>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts the backend's agent-framework spellings (`human`, `ai`) too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "human" => Ok(Role::User),
            "assistant" | "ai" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            "tool" => Ok(Role::Tool),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// One turn of the conversation as held by the session store.
///
/// Identity, role and timestamp are fixed at construction; there is no
/// way to mutate a message after it has been appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,
}

impl Message {
    fn new(role: Role, content: String, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
            timestamp: Utc::now(),
            tool_calls,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), Vec::new())
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::new(Role::Assistant, content.into(), tool_calls)
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Tools invoked while producing this message; empty for most turns.
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// A turn as reported by the backend inside a chat reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    /// Set on tool-role turns: the call this turn is the result of.
    pub tool_call_id: Option<String>,
}

/// Successful result of a chat exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub thread_id: ThreadId,
    pub turns: Vec<Turn>,
    pub final_response: String,
}

impl ChatReply {
    /// Tool invocations made during this exchange, in call order, with
    /// outputs filled in from the matching tool-role turns.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        let mut calls: Vec<ToolCall> = self
            .turns
            .iter()
            .filter(|turn| turn.role == Role::Assistant)
            .flat_map(|turn| turn.tool_calls.iter().cloned())
            .collect();

        for turn in self.turns.iter().filter(|turn| turn.role == Role::Tool) {
            let Some(call_id) = turn.tool_call_id.as_deref() else {
                continue;
            };
            if let Some(call) = calls.iter_mut().find(|call| call.id == call_id) {
                call.output = Some(turn.content.clone());
            }
        }

        calls
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub requires_api_key: bool,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsList {
    pub tools: Vec<ToolInfo>,
    pub total: usize,
}

/// Health/readiness report. `details` holds any extra fields the backend
/// includes (e.g. which upstream keys are configured).
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStatus {
    pub status: String,
    pub details: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStatus {
    pub status: String,
    pub thread_id: Option<ThreadId>,
}

/// Every way a backend exchange can fail, collapsed to user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request never completed (DNS, refused connection, reset).
    #[error("{0}")]
    Network(String),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Success status, but the body was not what the endpoint promises.
    #[error("invalid response from server: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Build an application error, preferring the backend's own detail text.
    pub fn api(status: u16, detail: Option<String>) -> Self {
        let message = match detail {
            Some(detail) if !detail.is_empty() => detail,
            _ => format!("HTTP error: {status}"),
        };
        TransportError::Api { status, message }
    }
}
