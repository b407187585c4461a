//! Session types and the in-flight guard.

use crate::{Message, ThreadId};

use super::store::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A send is already outstanding; overlapping sends are rejected.
    #[error("a message is already being sent")]
    Busy,
}

/// State-change notification published by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MessageAppended(Message),
    LoadingChanged(bool),
    ErrorChanged(Option<String>),
    /// History emptied and a fresh thread issued.
    Reset(ThreadId),
    /// Switched to an existing thread; history untouched.
    ThreadChanged(ThreadId),
}

/// How a completed `send_message` call was reconciled.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The assistant message that was appended.
    Replied(Message),
    /// The error text now held as the session's last error.
    Failed(String),
    /// The conversation was reset while the request was out, so its result
    /// was dropped.
    Discarded,
}

/// Owned copy of the session state at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub thread_id: ThreadId,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

/// Holds the loading flag for the duration of one send.
///
/// Dropping the guard returns the store to idle, so a send future that is
/// cancelled mid-request cannot leave the session stuck in loading.
pub(crate) struct InFlight<'a> {
    pub(super) store: &'a SessionStore,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.store.finish_send();
    }
}
