//! Backend configuration from TOML (`[backend]` section)

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Raw backend configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Root of the JSON API, including any path prefix
    pub base_url: String,
    /// Connect timeout, also applied to non-streaming requests
    pub timeout_secs: u64,
    /// Chatbot used for listing and creating conversations
    pub chatbot_id: Option<i64>,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            chatbot_id: None,
        }
    }
}

impl FileBackendConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}
