//! Chat API port
//!
//! Defines the interface to the chat backend: the streaming chat endpoint and
//! the conversation CRUD endpoints the session controller relies on.

use async_trait::async_trait;
use chatline_domain::{Conversation, ConversationId, ConversationPage, ConversationSummary};
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during chat API operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request failed with status {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

impl ApiError {
    /// The server-provided `detail`, if the backend rejected the request with one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => Some(detail),
            _ => None,
        }
    }

    /// Human-readable message for the UI: the server `detail` when present,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}

/// Lazy, finite sequence of content deltas for one chat request.
///
/// Ends after the terminal frame or when the transport closes. An `Err` item
/// is a transport failure mid-stream.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, ApiError>> + Send>>;

/// Backend operations used by the session controller.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Post a user message and open the assistant's response stream.
    ///
    /// Returns `Err` if the request could not be issued or the backend
    /// answered with a non-success status.
    async fn stream_chat(
        &self,
        conversation_id: ConversationId,
        message: &str,
    ) -> Result<DeltaStream, ApiError>;

    /// Fetch the authoritative conversation record, including its messages.
    async fn get_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Conversation, ApiError>;
}

/// Conversation management endpoints (listing, creation, deletion).
#[async_trait]
pub trait ConversationDirectory: Send + Sync {
    async fn list_conversations(
        &self,
        chatbot_id: i64,
        skip: u64,
        limit: u64,
    ) -> Result<ConversationPage, ApiError>;

    async fn create_conversation(
        &self,
        chatbot_id: i64,
        title: Option<&str>,
    ) -> Result<ConversationSummary, ApiError>;

    async fn delete_conversation(&self, conversation_id: ConversationId) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_detail() {
        let error = ApiError::Status {
            status: 400,
            detail: Some("Chatbot has no LLM provider configured".to_string()),
        };
        assert_eq!(
            error.user_message("Failed to send message"),
            "Chatbot has no LLM provider configured"
        );
    }

    #[test]
    fn user_message_falls_back_without_detail() {
        let fallback = "Failed to send message";
        let no_detail = ApiError::Status {
            status: 502,
            detail: None,
        };
        let blank_detail = ApiError::Status {
            status: 500,
            detail: Some("  ".to_string()),
        };
        assert_eq!(no_detail.user_message(fallback), fallback);
        assert_eq!(blank_detail.user_message(fallback), fallback);
        assert_eq!(
            ApiError::Connection("reset".to_string()).user_message(fallback),
            fallback
        );
    }

    #[test]
    fn status_display_includes_detail() {
        let error = ApiError::Status {
            status: 404,
            detail: Some("Conversation not found".to_string()),
        };
        assert_eq!(
            error.to_string(),
            "Request failed with status 404: Conversation not found"
        );
    }
}
