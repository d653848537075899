//! Port for structured transcript logging.
//!
//! Defines the [`ConversationLogger`] trait for recording chat session events
//! (user messages, assistant responses, rollbacks, reconciliation results)
//! to a machine-readable transcript.
//!
//! This is separate from `tracing`-based operation logs: tracing carries
//! diagnostics for developers, this port carries the conversation itself.

use serde_json::Value;

/// A structured transcript event.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "user_message", "assistant_response", "reconciled").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging transcript events.
///
/// `log` is synchronous and infallible; implementations swallow their own
/// write failures so a broken log never interrupts a chat.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when transcript logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
