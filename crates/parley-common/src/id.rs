use serde::{Deserialize, Serialize};
use std::fmt;

/// Random v4 UUID rendered as a hyphenated string.
///
/// Identifiers carry no ordering: conversation order comes from the
/// position of a message in the history, never from its id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(new_id())
            }

            /// Wrap an identifier that was issued elsewhere.
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Backend-side conversation context key, stable for one conversation.
    ThreadId
);

string_id!(
    /// Client-assigned identity of one message.
    MessageId
);
