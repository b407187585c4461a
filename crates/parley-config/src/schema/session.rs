use serde::{Deserialize, Serialize};

/// Session store tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Buffered events per subscriber before it starts lagging (valid range: 1-4096).
    pub event_capacity: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { event_capacity: 64 }
    }
}
