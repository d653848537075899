//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section is optional and falls back to its defaults.

mod backend;
mod chat;
mod logging;
mod output;
mod repl;

pub use backend::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, FileBackendConfig};
pub use chat::FileChatConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use repl::FileReplConfig;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("backend.base_url '{url}' is not a valid URL: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("backend.timeout_secs cannot be 0")]
    InvalidTimeout,

    #[error("backend.chatbot_id must be positive, got {0}")]
    InvalidChatbotId(i64),

    #[error("chat.failure_message cannot be empty")]
    EmptyFailureMessage,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Backend connection settings
    pub backend: FileBackendConfig,
    /// Chat session settings
    pub chat: FileChatConfig,
    /// Diagnostic log settings
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// REPL settings
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        match Url::parse(&self.backend.base_url) {
            Ok(url) if url.cannot_be_a_base() => issues.push(ConfigValidationError::InvalidBaseUrl {
                url: self.backend.base_url.clone(),
                reason: "not a base URL".to_string(),
            }),
            Ok(_) => {}
            Err(e) => issues.push(ConfigValidationError::InvalidBaseUrl {
                url: self.backend.base_url.clone(),
                reason: e.to_string(),
            }),
        }

        if self.backend.timeout_secs == 0 {
            issues.push(ConfigValidationError::InvalidTimeout);
        }

        if let Some(id) = self.backend.chatbot_id
            && id <= 0
        {
            issues.push(ConfigValidationError::InvalidChatbotId(id));
        }

        if self.chat.failure_message.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyFailureMessage);
        }

        issues
    }
}
