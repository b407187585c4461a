//! Conversation session management.
//!
//! A `SessionStore` owns one conversation: the ordered history, the backend
//! thread it belongs to, whether a send is in flight, and the last error.
//! All mutation goes through its methods; observers read snapshots or
//! subscribe to `SessionEvent`s.

mod send;
mod store;
mod types;


pub use store::SessionStore;
pub use types::{SendOutcome, SessionError, SessionEvent, SessionSnapshot};
