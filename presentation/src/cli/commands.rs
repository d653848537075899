//! CLI command definitions

use chatline_domain::ConversationId;
use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for chatline
#[derive(Parser, Debug)]
#[command(name = "chatline")]
#[command(author, version, about = "Terminal client for a streaming knowledge-base chat backend")]
#[command(long_about = r#"
chatline opens a conversation on a chat backend and streams the assistant's
answers into your terminal as they are generated.

Configuration files are loaded from (in priority order):
1. --config <path>                  Explicit config file
2. CHATLINE_* environment variables e.g. CHATLINE_BACKEND__BASE_URL
3. ./chatline.toml                  Project-level config
4. ~/.config/chatline/config.toml   Global config

Example:
  chatline 12
  chatline --chatbot 3 --list
  chatline --chatbot 3 --new "Billing questions"
"#)]
pub struct Cli {
    /// Conversation to open on start
    pub conversation: Option<ConversationId>,

    /// Chatbot used for listing and creating conversations
    #[arg(long, value_name = "ID")]
    pub chatbot: Option<i64>,

    /// Create a new conversation (optionally titled) and open it
    #[arg(long, value_name = "TITLE", num_args = 0..=1, default_missing_value = "")]
    pub new: Option<String>,

    /// List the chatbot's conversations and exit
    #[arg(long)]
    pub list: bool,

    /// Backend API root, e.g. http://localhost:8000/api
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Title requested by `--new`, if any. A bare `--new` yields `Some(None)`.
    pub fn new_conversation_title(&self) -> Option<Option<&str>> {
        self.new.as_deref().map(|title| {
            let title = title.trim();
            (!title.is_empty()).then_some(title)
        })
    }
}
