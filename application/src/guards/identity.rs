//! Active conversation identity guard.
//!
//! Asynchronous work captures an [`IdentitySnapshot`] before its first
//! suspension point and checks it with
//! [`ConversationIdentityGuard::is_still_active`] every time it resumes. A
//! conversation switch bumps the generation, so every older snapshot fails
//! the check, including snapshots of the same conversation id taken before
//! it was re-opened.

use chatline_domain::ConversationId;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identity captured when an asynchronous operation begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentitySnapshot {
    conversation_id: ConversationId,
    generation: u64,
}

impl IdentitySnapshot {
    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }
}

#[derive(Debug, Default)]
struct GuardState {
    active: Option<ConversationId>,
    generation: u64,
}

/// Holds the conversation the controller currently has authority over.
///
/// One instance exists per application session.
#[derive(Debug, Default)]
pub struct ConversationIdentityGuard {
    state: Mutex<GuardState>,
}

impl ConversationIdentityGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The currently active conversation, if any.
    pub fn active(&self) -> Option<ConversationId> {
        self.lock().active
    }

    /// Make `conversation_id` the active conversation, revoking every
    /// outstanding snapshot. Returns the snapshot of the new context.
    pub fn activate(&self, conversation_id: ConversationId) -> IdentitySnapshot {
        let mut state = self.lock();
        state.generation += 1;
        state.active = Some(conversation_id);
        IdentitySnapshot {
            conversation_id,
            generation: state.generation,
        }
    }

    /// Clear the active conversation, revoking every outstanding snapshot.
    pub fn deactivate(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.active = None;
    }

    /// Capture the current identity, or `None` if no conversation is active.
    pub fn snapshot(&self) -> Option<IdentitySnapshot> {
        let state = self.lock();
        state.active.map(|conversation_id| IdentitySnapshot {
            conversation_id,
            generation: state.generation,
        })
    }

    /// True only if nothing has switched since `snapshot` was taken.
    pub fn is_still_active(&self, snapshot: &IdentitySnapshot) -> bool {
        let state = self.lock();
        state.active == Some(snapshot.conversation_id) && state.generation == snapshot.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_snapshot_without_active_conversation() {
        let guard = ConversationIdentityGuard::new();
        assert!(guard.snapshot().is_none());
        assert!(guard.active().is_none());
    }

    #[test]
    fn snapshot_stays_valid_until_switch() {
        let guard = ConversationIdentityGuard::new();
        guard.activate(ConversationId::new(1));
        let snap = guard.snapshot().unwrap();
        assert!(guard.is_still_active(&snap));
        assert_eq!(snap.conversation_id(), ConversationId::new(1));

        guard.activate(ConversationId::new(2));
        assert!(!guard.is_still_active(&snap));
        assert_eq!(guard.active(), Some(ConversationId::new(2)));
    }

    #[test]
    fn reopening_same_conversation_revokes_old_snapshot() {
        let guard = ConversationIdentityGuard::new();
        let first = guard.activate(ConversationId::new(1));
        guard.activate(ConversationId::new(2));
        let second = guard.activate(ConversationId::new(1));

        assert!(!guard.is_still_active(&first));
        assert!(guard.is_still_active(&second));
    }

    #[test]
    fn deactivate_revokes_everything() {
        let guard = ConversationIdentityGuard::new();
        let snap = guard.activate(ConversationId::new(1));
        guard.deactivate();
        assert!(!guard.is_still_active(&snap));
        assert!(guard.snapshot().is_none());
    }
}
