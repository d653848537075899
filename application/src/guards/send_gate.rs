//! Per-conversation single-flight guard for outbound sends.

use chatline_domain::ConversationId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// At most one send may be in flight per conversation.
///
/// [`try_acquire`](Self::try_acquire) hands out a [`SendPermit`]; dropping
/// the permit releases the conversation, so every exit path of a send
/// (success, failure, superseded by a switch) releases exactly once.
#[derive(Debug, Default)]
pub struct SendGate {
    active: Mutex<HashSet<ConversationId>>,
}

impl SendGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<ConversationId>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the gate for `conversation_id`, or `None` if a send is
    /// already active for it.
    pub fn try_acquire(self: &Arc<Self>, conversation_id: ConversationId) -> Option<SendPermit> {
        if !self.lock().insert(conversation_id) {
            trace!("Send gate busy for conversation {}", conversation_id);
            return None;
        }
        Some(SendPermit {
            gate: Arc::clone(self),
            conversation_id,
        })
    }

    /// Whether a send is currently active for `conversation_id`.
    pub fn is_held(&self, conversation_id: ConversationId) -> bool {
        self.lock().contains(&conversation_id)
    }

    fn release(&self, conversation_id: ConversationId) {
        self.lock().remove(&conversation_id);
        trace!("Send gate released for conversation {}", conversation_id);
    }
}

/// Proof of a successful [`SendGate::try_acquire`]. Releases on drop.
#[derive(Debug)]
pub struct SendPermit {
    gate: Arc<SendGate>,
    conversation_id: ConversationId,
}

impl SendPermit {
    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }
}

impl Drop for SendPermit {
    fn drop(&mut self) {
        self.gate.release(self.conversation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let gate = Arc::new(SendGate::new());
        let id = ConversationId::new(1);

        let permit = gate.try_acquire(id).unwrap();
        assert!(gate.try_acquire(id).is_none());
        assert!(gate.is_held(id));

        drop(permit);
        assert!(!gate.is_held(id));
        assert!(gate.try_acquire(id).is_some());
    }

    #[test]
    fn conversations_are_independent() {
        let gate = Arc::new(SendGate::new());
        let _a = gate.try_acquire(ConversationId::new(1)).unwrap();
        let b = gate.try_acquire(ConversationId::new(2));
        assert!(b.is_some());
        assert_eq!(b.unwrap().conversation_id(), ConversationId::new(2));
    }
}
