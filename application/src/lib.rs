//! Application layer for chatline
//!
//! This crate contains the chat session controller, its guards, and the port
//! definitions adapters implement. It depends only on the domain layer.

pub mod config;
pub mod guards;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::SessionConfig;
pub use guards::{
    identity::{ConversationIdentityGuard, IdentitySnapshot},
    send_gate::{SendGate, SendPermit},
};
pub use ports::{
    chat_api::{ApiError, ChatApi, ConversationDirectory, DeltaStream},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    ui_event::UiEvent,
};
pub use use_cases::chat_session::{
    ChatSessionController, SendOutcome, SendRejection, SessionView,
};
pub use use_cases::reconcile::Reconciler;
