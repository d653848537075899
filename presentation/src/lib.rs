//! Presentation layer for chatline
//!
//! This crate contains CLI definitions, console rendering of session events,
//! and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod config;
pub mod output;

// Re-export commonly used types
pub use chat::{ChatRepl, ReplCommand};
pub use cli::commands::Cli;
pub use config::ReplConfig;
pub use output::console::{ConsoleFormatter, EventRenderer};
