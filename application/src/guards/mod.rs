//! Concurrency guards for the chat session controller.
//!
//! - [`identity::ConversationIdentityGuard`]: which conversation may mutate
//!   the visible state right now
//! - [`send_gate::SendGate`]: at most one outbound send per conversation

pub mod identity;
pub mod send_gate;
