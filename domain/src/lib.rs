//! Domain layer for chatline
//!
//! This crate contains the core entities and the session state machine.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Optimistic vs authoritative messages
//!
//! A message is *optimistic* while it only exists locally under a temporary
//! id, and *authoritative* once it has been returned by the server with a
//! durable id. Provenance is a property of the id, not a separate type.
//!
//! ## Session phases
//!
//! A [`ConversationSession`] moves through
//! `Idle → Sending → Streaming → Reconciling → Idle`, with a rollback edge
//! from the in-flight phases back to `Idle`.

pub mod conversation;
pub mod core;
pub mod session;

// Re-export commonly used types
pub use conversation::{
    entities::{Conversation, ConversationPage, ConversationSummary, Message, Role},
    ids::{ConversationId, MessageId, Provenance},
};
pub use core::error::DomainError;
pub use session::{entities::ConversationSession, phase::SessionPhase};
