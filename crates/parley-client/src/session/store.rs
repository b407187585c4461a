//! SessionStore struct and its synchronous state transitions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use parley_common::EventBus;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{ChatReply, ChatTransport, Message, ThreadId, TransportResult};

use super::types::{InFlight, SendOutcome, SessionError, SessionEvent, SessionSnapshot};

pub(super) const DEFAULT_EVENT_CAPACITY: usize = 64;

struct SessionState {
    messages: Vec<Message>,
    thread_id: ThreadId,
    is_loading: bool,
    last_error: Option<String>,
    /// Bumped when the history is reset. A reply is only reconciled into
    /// the epoch it was sent from.
    epoch: u64,
}

/// A send that has been admitted: the user message is in the history and
/// the loading flag is held until `_guard` drops.
pub(super) struct PendingSend<'a> {
    pub(super) _guard: InFlight<'a>,
    pub(super) thread_id: ThreadId,
    pub(super) epoch: u64,
}

/// Sole owner of one conversation's state.
pub struct SessionStore {
    pub(super) transport: Arc<dyn ChatTransport>,
    state: Mutex<SessionState>,
    events: EventBus<SessionEvent>,
}

impl SessionStore {
    /// Start a session on a freshly generated thread.
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            state: Mutex::new(SessionState {
                messages: Vec::new(),
                thread_id: ThreadId::new(),
                is_loading: false,
                last_error: None,
                epoch: 0,
            }),
            events: EventBus::new(DEFAULT_EVENT_CAPACITY),
        }
    }

    /// Replace the event buffer size. Call before subscribing.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.events = EventBus::new(capacity);
        self
    }

    pub fn transport(&self) -> &Arc<dyn ChatTransport> {
        &self.transport
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            messages: state.messages.clone(),
            thread_id: state.thread_id.clone(),
            is_loading: state.is_loading,
            last_error: state.last_error.clone(),
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.state().messages.len()
    }

    pub fn thread_id(&self) -> ThreadId {
        self.state().thread_id.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    /// Start a new conversation: empty history, fresh thread, no error.
    ///
    /// The backend is not told; its context for the old thread stays until
    /// deleted explicitly. A send still in flight will have its reply
    /// discarded.
    pub fn clear_messages(&self) -> ThreadId {
        let mut state = self.state();
        state.messages.clear();
        state.thread_id = ThreadId::new();
        state.epoch += 1;
        let new_thread = state.thread_id.clone();

        self.events.publish(SessionEvent::Reset(new_thread.clone()));
        if state.last_error.take().is_some() {
            self.events.publish(SessionEvent::ErrorChanged(None));
        }

        info!(thread_id = %new_thread, "conversation reset");
        new_thread
    }

    pub fn clear_error(&self) {
        let mut state = self.state();
        if state.last_error.take().is_some() {
            self.events.publish(SessionEvent::ErrorChanged(None));
        }
    }

    /// Continue an existing backend thread. History is left as is, and a
    /// send already in flight still lands in it.
    pub fn set_thread_id(&self, thread_id: ThreadId) {
        let mut state = self.state();
        if state.thread_id == thread_id {
            return;
        }
        state.thread_id = thread_id.clone();
        self.events.publish(SessionEvent::ThreadChanged(thread_id.clone()));
        info!(thread_id = %thread_id, "switched thread");
    }

    /// Never held across an await.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a send: enter loading and append the user's message.
    pub(super) fn begin_send(&self, content: &str) -> Result<PendingSend<'_>, SessionError> {
        let mut state = self.state();
        if state.is_loading {
            debug!("send rejected, another send is in flight");
            return Err(SessionError::Busy);
        }

        state.is_loading = true;
        self.events.publish(SessionEvent::LoadingChanged(true));

        let message = Message::user(content);
        state.messages.push(message.clone());
        self.events.publish(SessionEvent::MessageAppended(message));

        Ok(PendingSend {
            _guard: InFlight { store: self },
            thread_id: state.thread_id.clone(),
            epoch: state.epoch,
        })
    }

    /// Fold a transport result into the conversation it was sent from.
    pub(super) fn reconcile(
        &self,
        pending: &PendingSend<'_>,
        result: TransportResult<ChatReply>,
    ) -> SendOutcome {
        let mut state = self.state();
        if state.epoch != pending.epoch {
            debug!(thread_id = %pending.thread_id, "conversation reset during send, dropping result");
            return SendOutcome::Discarded;
        }

        match result {
            Ok(reply) => {
                if reply.thread_id != pending.thread_id {
                    warn!(
                        sent = %pending.thread_id,
                        received = %reply.thread_id,
                        "backend answered on a different thread, keeping ours"
                    );
                }

                let message = Message::assistant(reply.final_response.clone(), reply.tool_calls());
                state.messages.push(message.clone());
                self.events.publish(SessionEvent::MessageAppended(message.clone()));

                if state.last_error.take().is_some() {
                    self.events.publish(SessionEvent::ErrorChanged(None));
                }
                SendOutcome::Replied(message)
            }
            Err(e) => {
                let text = e.to_string();
                warn!(thread_id = %pending.thread_id, error = %text, "send failed");
                state.last_error = Some(text.clone());
                self.events.publish(SessionEvent::ErrorChanged(Some(text.clone())));
                SendOutcome::Failed(text)
            }
        }
    }

    /// Called by the in-flight guard on drop.
    pub(super) fn finish_send(&self) {
        let mut state = self.state();
        state.is_loading = false;
        self.events.publish(SessionEvent::LoadingChanged(false));
    }

    pub(super) fn record_error(&self, text: String) {
        let mut state = self.state();
        state.last_error = Some(text.clone());
        self.events.publish(SessionEvent::ErrorChanged(Some(text)));
    }
}
