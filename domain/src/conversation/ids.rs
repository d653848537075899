//! Identifier value objects

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned conversation identifier (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(i64);

impl ConversationId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| DomainError::InvalidConversationId(s.to_string()))
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Where a message currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Created locally, not yet confirmed by the server.
    Optimistic,
    /// Returned verbatim by the server.
    Authoritative,
}

/// Message identifier (Value Object)
///
/// Durable ids are integers assigned by the server. Temporary ids are strings
/// generated on the client for optimistic messages and are only ever replaced
/// wholesale during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Durable(i64),
    Temporary(String),
}

impl MessageId {
    /// Build a temporary id unique within one conversation session.
    pub fn temporary(conversation_id: ConversationId, seq: u64) -> Self {
        MessageId::Temporary(format!("tmp-{}-{}", conversation_id, seq))
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            MessageId::Durable(_) => Provenance::Authoritative,
            MessageId::Temporary(_) => Provenance::Optimistic,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, MessageId::Temporary(_))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Durable(id) => write!(f, "{}", id),
            MessageId::Temporary(id) => f.write_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_parses_and_displays() {
        let id: ConversationId = " 42 ".parse().unwrap();
        assert_eq!(id, ConversationId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn conversation_id_rejects_garbage() {
        let err = "abc".parse::<ConversationId>().unwrap_err();
        assert_eq!(err, DomainError::InvalidConversationId("abc".to_string()));
    }

    #[test]
    fn message_id_provenance() {
        let tmp = MessageId::temporary(ConversationId::new(7), 1);
        assert_eq!(tmp.to_string(), "tmp-7-1");
        assert_eq!(tmp.provenance(), Provenance::Optimistic);
        assert_eq!(MessageId::Durable(3).provenance(), Provenance::Authoritative);
    }

    #[test]
    fn message_id_deserializes_server_integers_as_durable() {
        let id: MessageId = serde_json::from_str("15").unwrap();
        assert_eq!(id, MessageId::Durable(15));

        let id: MessageId = serde_json::from_str("\"tmp-1-2\"").unwrap();
        assert!(id.is_temporary());
    }
}
