//! Application-level configuration.
//!
//! Controls how the chat session controller reports failures to the user.

/// Generic message shown when a send fails without a server-provided detail.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to send message";

/// Generic message shown when the authoritative record cannot be fetched.
pub const DEFAULT_RECONCILE_FAILURE_MESSAGE: &str =
    "Reply received, but the conversation could not be refreshed";

/// Chat session behavior configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fallback for failed sends when the backend supplies no `detail`.
    pub failure_message: String,
    /// Fallback for failed reconciliation when the backend supplies no `detail`.
    pub reconcile_failure_message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
            reconcile_failure_message: DEFAULT_RECONCILE_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = message.into();
        self
    }
}
