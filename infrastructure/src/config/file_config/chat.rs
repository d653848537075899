//! Chat session configuration from TOML (`[chat]` section)

use chatline_application::SessionConfig;
use chatline_application::config::DEFAULT_FAILURE_MESSAGE;
use serde::{Deserialize, Serialize};

/// Raw chat configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Shown when a send fails and the server gave no detail
    pub failure_message: String,
    /// Append a JSONL transcript of session events to this file
    pub transcript_log: Option<String>,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        Self {
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
            transcript_log: None,
        }
    }
}

impl FileChatConfig {
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig::default().with_failure_message(self.failure_message.clone())
    }
}
