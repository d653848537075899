//! Configuration file loading for chatline
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. `CHATLINE_*` environment variables
//! 3. Project root: `./chatline.toml` or `./.chatline.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/chatline/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, FileBackendConfig,
    FileChatConfig, FileConfig, FileLoggingConfig, FileOutputConfig, FileReplConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
