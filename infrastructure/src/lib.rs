//! Infrastructure layer for chatline
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the HTTP chat backend (with its streaming frame
//! decoder), configuration file loading, and the JSONL transcript logger.

pub mod backend;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use backend::{BackendError, FrameDecoder, HttpChatApi, decode_deltas};
pub use config::{
    ConfigLoader, ConfigValidationError, FileBackendConfig, FileChatConfig, FileConfig,
    FileLoggingConfig, FileOutputConfig, FileReplConfig,
};
pub use logging::JsonlConversationLogger;
