//! Presentation-level configuration
//!
//! Settings the REPL needs that are resolved by the binary from the config
//! file and command-line flags.

use std::path::PathBuf;

/// Default number of conversations shown by `/list`
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// REPL configuration for the presentation layer
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Chatbot used by `/list` and `/new`
    pub chatbot_id: Option<i64>,
    /// Path to history file (`None` uses the platform data directory)
    pub history_file: Option<PathBuf>,
    /// Conversations per `/list` page
    pub page_size: u64,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            chatbot_id: None,
            history_file: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ReplConfig {
    /// The history file to use, falling back to `<data dir>/chatline/history.txt`.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("chatline").join("history.txt")))
    }
}
