//! Domain error types

use crate::session::phase::SessionPhase;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionPhase,
        to: SessionPhase,
    },

    #[error("Session is busy ({phase})")]
    SessionBusy { phase: SessionPhase },

    #[error("{count} message(s) from an earlier exchange are not reconciled yet")]
    UnreconciledMessages { count: usize },

    #[error("No exchange in flight")]
    NoExchangeInFlight,

    #[error("Message belongs to conversation {actual}, expected {expected}")]
    ConversationMismatch { expected: i64, actual: i64 },

    #[error("Invalid conversation id: {0}")]
    InvalidConversationId(String),
}

impl DomainError {
    /// Check if this error is a rejected phase transition
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, DomainError::InvalidTransition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let error = DomainError::InvalidTransition {
            from: SessionPhase::Streaming,
            to: SessionPhase::Sending,
        };
        assert_eq!(
            error.to_string(),
            "Invalid session transition: streaming -> sending"
        );
    }

    #[test]
    fn test_is_invalid_transition_check() {
        assert!(
            DomainError::InvalidTransition {
                from: SessionPhase::Idle,
                to: SessionPhase::Reconciling,
            }
            .is_invalid_transition()
        );
        assert!(!DomainError::EmptyMessage.is_invalid_transition());
        assert!(!DomainError::NoExchangeInFlight.is_invalid_transition());
    }
}
