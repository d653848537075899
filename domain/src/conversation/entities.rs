//! Conversation domain entities

use super::ids::{ConversationId, MessageId, Provenance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub tokens_used: Option<i64>,
    /// Cited document sources, as the raw JSON text the server stores.
    #[serde(default)]
    pub sources: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a locally-generated message stamped with the current time.
    pub fn optimistic(
        id: MessageId,
        conversation_id: ConversationId,
        role: Role,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            role,
            content: content.into(),
            tokens_used: None,
            sources: None,
            created_at: Utc::now(),
        }
    }

    pub fn provenance(&self) -> Provenance {
        self.id.provenance()
    }

    pub fn is_optimistic(&self) -> bool {
        self.provenance() == Provenance::Optimistic
    }
}

/// Conversation listing entry, as returned by the collaborator API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub chatbot_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u64,
    /// Preview of the newest message.
    #[serde(default)]
    pub last_message: Option<String>,
}

/// One page of conversations for a chatbot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPage {
    pub total: u64,
    pub items: Vec<ConversationSummary>,
}

/// The server's authoritative conversation record (Entity)
///
/// `messages` are in conversation order. Every id in here is durable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(flatten)]
    pub summary: ConversationSummary,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn id(&self) -> ConversationId {
        self.summary.id
    }

    pub fn title(&self) -> Option<&str> {
        self.summary.title.as_deref()
    }

    /// Consume the record, keeping only its message list.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
