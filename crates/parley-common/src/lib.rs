pub mod errors;
pub mod events;
pub mod id;

pub use errors::{ConfigError, ParleyError};
pub use events::EventBus;
pub use id::{new_id, MessageId, ThreadId};

pub type Result<T> = std::result::Result<T, ParleyError>;
