//! Session domain entities

use super::phase::SessionPhase;
use crate::conversation::entities::{Message, Role};
use crate::conversation::ids::{ConversationId, MessageId};
use crate::core::error::DomainError;

/// The optimistic pair produced by the send currently in flight.
#[derive(Debug, Clone)]
struct PendingExchange {
    user_id: MessageId,
    assistant_id: Option<MessageId>,
}

/// Locally visible state of one conversation (Entity)
///
/// Holds the ordered message list, the in-progress streaming buffer and the
/// send cycle phase. Every mutation goes through a phase check, so the
/// optimistic user/assistant pair can only exist for the exchange in flight.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    conversation_id: ConversationId,
    messages: Vec<Message>,
    streaming_buffer: Option<String>,
    phase: SessionPhase,
    pending: Option<PendingExchange>,
    next_temp_seq: u64,
}

impl ConversationSession {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            messages: Vec::new(),
            streaming_buffer: None,
            phase: SessionPhase::Idle,
            pending: None,
            next_temp_seq: 1,
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn streaming_buffer(&self) -> Option<&str> {
        self.streaming_buffer.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Number of optimistic messages with the given role.
    pub fn optimistic_count(&self, role: Role) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == role && m.is_optimistic())
            .count()
    }

    /// Replace the message list with a freshly loaded authoritative one.
    ///
    /// Only allowed while idle; a send cycle owns the list otherwise.
    pub fn load(&mut self, messages: Vec<Message>) -> Result<(), DomainError> {
        if !self.phase.is_idle() {
            return Err(DomainError::SessionBusy { phase: self.phase });
        }
        self.check_ownership(&messages)?;
        self.messages = messages;
        Ok(())
    }

    /// Append the optimistic user message and enter `Sending`.
    pub fn begin_send(&mut self, text: &str) -> Result<&Message, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::EmptyMessage);
        }
        if self.phase.is_idle() {
            // At most one optimistic pair may exist at a time.
            let count = self.messages.iter().filter(|m| m.is_optimistic()).count();
            if count > 0 {
                return Err(DomainError::UnreconciledMessages { count });
            }
        }
        self.transition(SessionPhase::Sending)?;

        let id = self.next_temp_id();
        self.messages.push(Message::optimistic(
            id.clone(),
            self.conversation_id,
            Role::User,
            text,
        ));
        self.pending = Some(PendingExchange {
            user_id: id,
            assistant_id: None,
        });
        self.streaming_buffer = None;

        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Accumulate one decoded delta, returning the whole buffer so far.
    pub fn apply_delta(&mut self, delta: &str) -> Result<&str, DomainError> {
        self.transition(SessionPhase::Streaming)?;
        let buffer = self.streaming_buffer.get_or_insert_with(String::new);
        buffer.push_str(delta);
        Ok(buffer.as_str())
    }

    /// Turn the streaming buffer into the optimistic assistant message and
    /// enter `Reconciling`.
    pub fn finish_stream(&mut self) -> Result<&Message, DomainError> {
        if self.pending.is_none() {
            return Err(DomainError::NoExchangeInFlight);
        }
        self.transition(SessionPhase::Reconciling)?;

        let content = self.streaming_buffer.take().unwrap_or_default();
        let id = self.next_temp_id();
        self.messages.push(Message::optimistic(
            id.clone(),
            self.conversation_id,
            Role::Assistant,
            content,
        ));
        if let Some(pending) = self.pending.as_mut() {
            pending.assistant_id = Some(id);
        }

        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Undo a failed send: drop the optimistic user message and any partial
    /// assistant content, then return to `Idle`.
    pub fn rollback(&mut self) -> Result<Message, DomainError> {
        if !self.phase.is_in_flight() {
            return Err(DomainError::InvalidTransition {
                from: self.phase,
                to: SessionPhase::Idle,
            });
        }
        let pending = self.pending.take().ok_or(DomainError::NoExchangeInFlight)?;
        self.streaming_buffer = None;
        self.phase = SessionPhase::Idle;

        let index = self
            .messages
            .iter()
            .position(|m| m.id == pending.user_id)
            .ok_or(DomainError::NoExchangeInFlight)?;
        Ok(self.messages.remove(index))
    }

    /// Swap in the authoritative message list and return to `Idle`.
    ///
    /// Returns whether the text of the optimistic pair is preserved by the
    /// authoritative tail, i.e. whether the swap is invisible apart from ids.
    pub fn reconcile(&mut self, messages: Vec<Message>) -> Result<bool, DomainError> {
        if self.phase != SessionPhase::Reconciling {
            return Err(DomainError::InvalidTransition {
                from: self.phase,
                to: SessionPhase::Idle,
            });
        }
        self.check_ownership(&messages)?;

        let preserved = self.pending_text_preserved(&messages);
        self.messages = messages;
        self.pending = None;
        self.phase = SessionPhase::Idle;
        Ok(preserved)
    }

    /// Give up on reconciliation. The optimistic pair stays visible with its
    /// temporary ids until the next authoritative load replaces it.
    pub fn abandon_reconcile(&mut self) -> Result<(), DomainError> {
        if self.phase != SessionPhase::Reconciling {
            return Err(DomainError::InvalidTransition {
                from: self.phase,
                to: SessionPhase::Idle,
            });
        }
        self.pending = None;
        self.phase = SessionPhase::Idle;
        Ok(())
    }

    fn transition(&mut self, next: SessionPhase) -> Result<(), DomainError> {
        if !self.phase.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    fn next_temp_id(&mut self) -> MessageId {
        let id = MessageId::temporary(self.conversation_id, self.next_temp_seq);
        self.next_temp_seq += 1;
        id
    }

    fn check_ownership(&self, messages: &[Message]) -> Result<(), DomainError> {
        match messages
            .iter()
            .find(|m| m.conversation_id != self.conversation_id)
        {
            Some(foreign) => Err(DomainError::ConversationMismatch {
                expected: self.conversation_id.get(),
                actual: foreign.conversation_id.get(),
            }),
            None => Ok(()),
        }
    }

    fn pending_text_preserved(&self, incoming: &[Message]) -> bool {
        let Some(pending) = &self.pending else {
            return true;
        };
        let local_text = |id: &MessageId| {
            self.messages
                .iter()
                .find(|m| &m.id == id)
                .map(|m| (m.role, m.content.as_str()))
        };

        let mut expected = Vec::new();
        expected.extend(local_text(&pending.user_id));
        if let Some(assistant_id) = &pending.assistant_id {
            expected.extend(local_text(assistant_id));
        }
        if incoming.len() < expected.len() {
            return false;
        }

        incoming[incoming.len() - expected.len()..]
            .iter()
            .zip(expected)
            .all(|(m, (role, content))| m.role == role && m.content == content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn conv() -> ConversationId {
        ConversationId::new(5)
    }

    fn durable(id: i64, role: Role, content: &str) -> Message {
        Message {
            id: MessageId::Durable(id),
            conversation_id: conv(),
            role,
            content: content.to_string(),
            tokens_used: None,
            sources: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn begin_send_appends_optimistic_user_message() {
        let mut session = ConversationSession::new(conv());
        let msg = session.begin_send("hello").unwrap();
        assert!(msg.is_optimistic());
        assert_eq!(msg.role, Role::User);
        assert_eq!(session.phase(), SessionPhase::Sending);
        assert_eq!(session.optimistic_count(Role::User), 1);
    }

    #[test]
    fn begin_send_rejects_whitespace_without_state_change() {
        let mut session = ConversationSession::new(conv());
        assert_eq!(session.begin_send("  \n\t"), Err(DomainError::EmptyMessage));
        assert!(session.messages().is_empty());
        assert!(session.phase().is_idle());
    }

    #[test]
    fn second_send_is_rejected_while_in_flight() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("one").unwrap();
        let err = session.begin_send("two").unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn deltas_accumulate_in_arrival_order() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("q").unwrap();
        assert_eq!(session.apply_delta("hel").unwrap(), "hel");
        assert_eq!(session.apply_delta("lo ").unwrap(), "hello ");
        assert_eq!(session.apply_delta("world").unwrap(), "hello world");
        assert_eq!(session.phase(), SessionPhase::Streaming);
    }

    #[test]
    fn delta_without_send_is_rejected() {
        let mut session = ConversationSession::new(conv());
        assert!(session.apply_delta("x").is_err());
        assert!(session.streaming_buffer().is_none());
    }

    #[test]
    fn finish_stream_creates_optimistic_assistant() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("q").unwrap();
        session.apply_delta("answer").unwrap();
        let msg = session.finish_stream().unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "answer");
        assert!(session.streaming_buffer().is_none());
        assert_eq!(session.phase(), SessionPhase::Reconciling);
        assert_eq!(session.optimistic_count(Role::Assistant), 1);
    }

    #[test]
    fn empty_stream_still_finishes() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("q").unwrap();
        let msg = session.finish_stream().unwrap();
        assert_eq!(msg.content, "");
    }

    #[test]
    fn rollback_removes_only_the_triggering_user_message() {
        let mut session = ConversationSession::new(conv());
        session
            .load(vec![durable(1, Role::User, "earlier"), durable(2, Role::Assistant, "reply")])
            .unwrap();
        session.begin_send("doomed").unwrap();
        session.apply_delta("partial").unwrap();

        let removed = session.rollback().unwrap();
        assert_eq!(removed.content, "doomed");
        assert_eq!(session.messages().len(), 2);
        assert!(session.streaming_buffer().is_none());
        assert!(session.phase().is_idle());
        session.begin_send("retry").unwrap();
    }

    #[test]
    fn rollback_after_stream_finished_is_rejected() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("q").unwrap();
        session.finish_stream().unwrap();
        assert!(session.rollback().is_err());
    }

    #[test]
    fn reconcile_swaps_ids_and_preserves_text() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("hi").unwrap();
        session.apply_delta("hello world").unwrap();
        session.finish_stream().unwrap();

        let preserved = session
            .reconcile(vec![
                durable(10, Role::User, "hi"),
                durable(11, Role::Assistant, "hello world"),
            ])
            .unwrap();

        assert!(preserved);
        assert!(session.phase().is_idle());
        assert_eq!(session.messages()[1].id, MessageId::Durable(11));
        assert_eq!(session.messages()[1].content, "hello world");
        assert_eq!(session.optimistic_count(Role::Assistant), 0);
    }

    #[test]
    fn reconcile_reports_diverging_text() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("hi").unwrap();
        session.apply_delta("hello").unwrap();
        session.finish_stream().unwrap();

        let preserved = session
            .reconcile(vec![
                durable(10, Role::User, "hi"),
                durable(11, Role::Assistant, "something else"),
            ])
            .unwrap();
        assert!(!preserved);
    }

    #[test]
    fn reconcile_rejects_foreign_messages() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("hi").unwrap();
        session.finish_stream().unwrap();

        let mut foreign = durable(1, Role::User, "hi");
        foreign.conversation_id = ConversationId::new(99);
        let err = session.reconcile(vec![foreign]).unwrap_err();
        assert_eq!(
            err,
            DomainError::ConversationMismatch {
                expected: 5,
                actual: 99
            }
        );
        assert_eq!(session.phase(), SessionPhase::Reconciling);
    }

    #[test]
    fn abandoned_reconcile_keeps_optimistic_pair() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("hi").unwrap();
        session.apply_delta("answer").unwrap();
        session.finish_stream().unwrap();
        session.abandon_reconcile().unwrap();

        assert!(session.phase().is_idle());
        assert_eq!(session.messages().len(), 2);
        assert!(session.messages().iter().all(Message::is_optimistic));
    }

    #[test]
    fn send_is_refused_while_an_abandoned_pair_is_visible() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("hi").unwrap();
        session.apply_delta("answer").unwrap();
        session.finish_stream().unwrap();
        session.abandon_reconcile().unwrap();

        assert_eq!(
            session.begin_send("again"),
            Err(DomainError::UnreconciledMessages { count: 2 })
        );
        assert_eq!(session.messages().len(), 2);
        assert!(session.phase().is_idle());

        // An authoritative load clears the way for the next send.
        session
            .load(vec![durable(1, Role::User, "hi"), durable(2, Role::Assistant, "answer")])
            .unwrap();
        session.begin_send("again").unwrap();
        assert_eq!(session.optimistic_count(Role::User), 1);
    }

    #[test]
    fn load_is_refused_mid_cycle() {
        let mut session = ConversationSession::new(conv());
        session.begin_send("hi").unwrap();
        assert_eq!(
            session.load(Vec::new()),
            Err(DomainError::SessionBusy {
                phase: SessionPhase::Sending
            })
        );
    }
}
