//! Conversation session domain.
//!
//! - [`entities::ConversationSession`]: the locally visible message list and
//!   streaming buffer of one conversation
//! - [`phase::SessionPhase`]: the send cycle state machine

pub mod entities;
pub mod phase;
