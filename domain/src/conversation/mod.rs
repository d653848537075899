//! Conversation domain.
//!
//! - [`ids::ConversationId`] / [`ids::MessageId`]: identifiers, including the
//!   temporary ids handed out to optimistic messages
//! - [`entities::Message`]: a single message within a conversation
//! - [`entities::Conversation`]: the server's authoritative record

pub mod entities;
pub mod ids;
