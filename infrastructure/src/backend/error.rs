//! Error types for the HTTP backend adapter

use chatline_application::ports::chat_api::ApiError;
use thiserror::Error;

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur when talking to the chat backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend returned status {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl From<BackendError> for ApiError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Http(e) if e.is_timeout() => ApiError::Timeout,
            BackendError::Http(e) if e.is_decode() => ApiError::Decode(e.to_string()),
            BackendError::Http(e) => ApiError::Connection(e.to_string()),
            BackendError::Serialization(e) => ApiError::Decode(e.to_string()),
            BackendError::Status { status, detail } => ApiError::Status { status, detail },
            e @ BackendError::InvalidBaseUrl { .. } => ApiError::Other(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_keeps_detail() {
        let api: ApiError = BackendError::Status {
            status: 404,
            detail: Some("Conversation not found".to_string()),
        }
        .into();
        assert_eq!(api.detail(), Some("Conversation not found"));
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let api: ApiError = BackendError::from(json_err).into();
        assert!(matches!(api, ApiError::Decode(_)));
    }
}
