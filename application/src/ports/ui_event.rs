//! UI event types emitted by ChatSessionController for presentation layer rendering
//!
//! These events form the output port from the application layer to the
//! presentation layer. Every event describes state that is already applied;
//! renderers never have to reconstruct the message list themselves.

use chatline_domain::{ConversationId, Message, SessionPhase};

/// Events emitted by ChatSessionController for the presentation layer to render
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // === Conversation Lifecycle ===
    /// The active conversation changed (`None` when closed)
    ConversationSwitched {
        conversation_id: Option<ConversationId>,
    },
    /// Loading the conversation record failed
    LoadFailed {
        conversation_id: ConversationId,
        message: String,
    },

    // === Send Cycle ===
    /// The visible message list changed
    MessagesChanged {
        conversation_id: ConversationId,
        messages: Vec<Message>,
    },
    /// The text input should be cleared (the message was accepted)
    InputCleared,
    /// The "assistant is typing" content grew; `content` is the whole buffer
    StreamingUpdated {
        conversation_id: ConversationId,
        content: String,
    },
    /// The session moved to a new phase
    PhaseChanged {
        conversation_id: ConversationId,
        phase: SessionPhase,
    },
    /// A send failed and was rolled back
    SendFailed {
        conversation_id: ConversationId,
        message: String,
    },
    /// The answer arrived but the authoritative record could not be fetched
    ReconcileFailed {
        conversation_id: ConversationId,
        message: String,
    },
}

impl UiEvent {
    /// The conversation this event belongs to, if any.
    pub fn conversation_id(&self) -> Option<ConversationId> {
        match self {
            UiEvent::ConversationSwitched { conversation_id } => *conversation_id,
            UiEvent::InputCleared => None,
            UiEvent::LoadFailed {
                conversation_id, ..
            }
            | UiEvent::MessagesChanged {
                conversation_id, ..
            }
            | UiEvent::StreamingUpdated {
                conversation_id, ..
            }
            | UiEvent::PhaseChanged {
                conversation_id, ..
            }
            | UiEvent::SendFailed {
                conversation_id, ..
            }
            | UiEvent::ReconcileFailed {
                conversation_id, ..
            } => Some(*conversation_id),
        }
    }
}
