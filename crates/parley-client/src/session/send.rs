//! Async operations on SessionStore: sending a turn and deleting the thread.

use tracing::{debug, info};

use crate::{DeleteStatus, TransportResult};

use super::store::SessionStore;
use super::types::{SendOutcome, SessionError};

impl SessionStore {
    /// Send one user turn and reconcile the backend's answer.
    ///
    /// The user's message is appended before the request goes out and stays
    /// in the history whatever happens next. On success exactly one
    /// assistant message is appended and any previous error is cleared; on
    /// failure the error text becomes `last_error` and nothing else is
    /// appended. Returns `SessionError::Busy` without touching state if
    /// another send is still in flight.
    pub async fn send_message(
        &self,
        content: impl Into<String>,
    ) -> Result<SendOutcome, SessionError> {
        let content = content.into();
        let pending = self.begin_send(&content)?;

        debug!(thread_id = %pending.thread_id, "sending message");
        let result = self
            .transport
            .send_chat(&content, &pending.thread_id)
            .await;

        let outcome = self.reconcile(&pending, result);
        drop(pending);
        Ok(outcome)
    }

    /// Ask the backend to forget the current thread, then start a new
    /// conversation locally.
    ///
    /// On failure the error is recorded as `last_error` and the local
    /// conversation is left untouched.
    pub async fn delete_thread(&self) -> TransportResult<DeleteStatus> {
        let thread_id = self.thread_id();

        match self.transport.delete_thread(&thread_id).await {
            Ok(status) => {
                info!(thread_id = %thread_id, status = %status.status, "backend thread deleted");
                if self.thread_id() == thread_id {
                    self.clear_messages();
                }
                Ok(status)
            }
            Err(e) => {
                self.record_error(e.to_string());
                Err(e)
            }
        }
    }
}
