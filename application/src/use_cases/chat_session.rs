//! Chat Session Controller
//!
//! Orchestrates the send → stream → reconcile → idle cycle for the active
//! conversation and owns its visible message list and streaming buffer.
//! Emits UiEvent messages to a channel for the presentation layer to render.
//!
//! # Suspension points
//!
//! A send suspends while waiting for the next delta and while waiting for
//! the authoritative record. All state changes happen between suspensions,
//! under the state lock, and only after the captured [`IdentitySnapshot`]
//! has been re-checked. A conversation switch therefore never aborts a
//! request; it only revokes that request's right to touch visible state.
//! The stale request keeps draining and its results are dropped.

use crate::config::SessionConfig;
use crate::guards::identity::{ConversationIdentityGuard, IdentitySnapshot};
use crate::guards::send_gate::{SendGate, SendPermit};
use crate::ports::chat_api::{ApiError, ChatApi};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::ui_event::UiEvent;
use crate::use_cases::reconcile::Reconciler;
use chatline_domain::{ConversationId, ConversationSession, DomainError, Message, SessionPhase};
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Why a send was refused before anything happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    /// No conversation is open
    NoConversation,
    /// The input was empty or whitespace-only
    EmptyMessage,
    /// A send is already in flight for this conversation
    Busy,
    /// The previous answer is still shown under temporary ids and the
    /// authoritative record could not be fetched to replace it
    Unreconciled,
}

/// Result of [`ChatSessionController::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Refused synchronously; no state change and no network request
    Rejected(SendRejection),
    /// The answer was streamed in full. `reconciled` is false when the
    /// authoritative record could not be fetched and the optimistic pair
    /// stays on screen.
    Delivered { reconciled: bool },
    /// Transport failure; the optimistic user message was rolled back
    Failed { message: String },
    /// The conversation was switched mid-flight; results were dropped
    Superseded,
}

/// Read-only copy of the active session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub conversation_id: ConversationId,
    pub messages: Vec<Message>,
    pub streaming_buffer: Option<String>,
    pub phase: SessionPhase,
}

/// Controller for the active chat session.
///
/// Cloning is cheap and every clone drives the same state, so a send can be
/// awaited on one task while another switches conversations.
pub struct ChatSessionController<A: ChatApi + 'static> {
    api: Arc<A>,
    reconciler: Reconciler<A>,
    guard: Arc<ConversationIdentityGuard>,
    gate: Arc<SendGate>,
    /// The active session; `None` when no conversation is open
    state: Arc<Mutex<Option<ConversationSession>>>,
    /// Channel sender for UI events
    tx: mpsc::UnboundedSender<UiEvent>,
    /// Transcript logger for structured event logging
    conversation_logger: Arc<dyn ConversationLogger>,
    config: SessionConfig,
}

impl<A: ChatApi + 'static> Clone for ChatSessionController<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            reconciler: self.reconciler.clone(),
            guard: Arc::clone(&self.guard),
            gate: Arc::clone(&self.gate),
            state: Arc::clone(&self.state),
            tx: self.tx.clone(),
            conversation_logger: Arc::clone(&self.conversation_logger),
            config: self.config.clone(),
        }
    }
}

impl<A: ChatApi + 'static> ChatSessionController<A> {
    /// Create a new ChatSessionController
    pub fn new(api: Arc<A>, tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self {
            reconciler: Reconciler::new(Arc::clone(&api)),
            api,
            guard: Arc::new(ConversationIdentityGuard::new()),
            gate: Arc::new(SendGate::new()),
            state: Arc::new(Mutex::new(None)),
            tx,
            conversation_logger: Arc::new(NoConversationLogger),
            config: SessionConfig::default(),
        }
    }

    /// Set a conversation logger for structured transcript logging.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Set the failure messages shown to the user.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// The conversation currently bound to the UI.
    pub fn active_conversation(&self) -> Option<ConversationId> {
        self.guard.active()
    }

    /// Whether a send is in flight for `conversation_id`, including a stale
    /// one that is still draining after a switch.
    pub fn is_sending(&self, conversation_id: ConversationId) -> bool {
        self.gate.is_held(conversation_id)
    }

    /// Snapshot of the active session.
    pub fn snapshot(&self) -> Option<SessionView> {
        self.lock_state().as_ref().map(|session| SessionView {
            conversation_id: session.conversation_id(),
            messages: session.messages().to_vec(),
            streaming_buffer: session.streaming_buffer().map(str::to_string),
            phase: session.phase(),
        })
    }

    // ==================== Conversation switching ====================

    /// Make `conversation_id` the active conversation and load its record.
    ///
    /// The switch itself is synchronous: by the time this function first
    /// suspends, every older request has lost its right to touch the UI.
    pub async fn open_conversation(&self, conversation_id: ConversationId) -> Result<(), ApiError> {
        let snapshot = {
            let mut state = self.lock_state();
            let snapshot = self.guard.activate(conversation_id);
            *state = Some(ConversationSession::new(conversation_id));
            self.emit(UiEvent::ConversationSwitched {
                conversation_id: Some(conversation_id),
            });
            snapshot
        };

        info!("Switched to conversation {}", conversation_id);
        self.conversation_logger.log(ConversationEvent::new(
            "conversation_switched",
            serde_json::json!({ "conversation_id": conversation_id }),
        ));

        self.load(snapshot).await
    }

    /// Re-fetch the active conversation's record. No-op while a send cycle
    /// owns the message list.
    pub async fn reload(&self) -> Result<(), ApiError> {
        let snapshot = {
            let state = self.lock_state();
            match (state.as_ref(), self.guard.snapshot()) {
                (Some(session), Some(snapshot)) if session.phase().is_idle() => snapshot,
                _ => return Ok(()),
            }
        };
        self.load(snapshot).await
    }

    /// Unbind the UI from any conversation. In-flight results are discarded.
    pub fn close_conversation(&self) {
        let mut state = self.lock_state();
        self.guard.deactivate();
        *state = None;
        self.emit(UiEvent::ConversationSwitched {
            conversation_id: None,
        });
    }

    async fn load(&self, snapshot: IdentitySnapshot) -> Result<(), ApiError> {
        let conversation_id = snapshot.conversation_id();

        match self.reconciler.reconcile(conversation_id).await {
            Ok(messages) => {
                self.with_active_session(&snapshot, |session| match session.load(messages) {
                    Ok(()) => self.emit_messages(session),
                    Err(e) => debug!("Skipping load of conversation {}: {}", conversation_id, e),
                });
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load conversation {}: {}", conversation_id, e);
                self.with_active_session(&snapshot, |_| {
                    self.emit(UiEvent::LoadFailed {
                        conversation_id,
                        message: e.to_string(),
                    });
                });
                Err(e)
            }
        }
    }

    // ==================== Send cycle ====================

    /// Send `text` to the active conversation and run the full cycle.
    ///
    /// Returns once the cycle is over for this request: delivered, rolled
    /// back, or superseded by a conversation switch (in which case the
    /// response has been drained and dropped).
    pub async fn send(&self, text: &str) -> SendOutcome {
        let started = match self.begin_send(text) {
            Err(SendRejection::Unreconciled) => {
                // Replace the stranded pair with the server's record first.
                info!("Reloading before send to heal an unreconciled exchange");
                if let Err(e) = self.reload().await {
                    debug!("Reload before send failed: {}", e);
                }
                self.begin_send(text)
            }
            other => other,
        };
        let (snapshot, permit) = match started {
            Ok(started) => started,
            Err(reason) => {
                debug!("Send rejected: {:?}", reason);
                return SendOutcome::Rejected(reason);
            }
        };

        let outcome = self.run_cycle(&snapshot, text).await;

        if outcome == SendOutcome::Superseded {
            info!(
                "Conversation {} switched away mid-send; result discarded",
                snapshot.conversation_id()
            );
            self.conversation_logger.log(ConversationEvent::new(
                "stale_discarded",
                serde_json::json!({ "conversation_id": snapshot.conversation_id() }),
            ));
        }

        drop(permit);
        outcome
    }

    /// Guard clauses and the optimistic user message. Never suspends.
    fn begin_send(&self, text: &str) -> Result<(IdentitySnapshot, SendPermit), SendRejection> {
        let mut state = self.lock_state();
        let session = state.as_mut().ok_or(SendRejection::NoConversation)?;
        let conversation_id = session.conversation_id();

        if text.trim().is_empty() {
            return Err(SendRejection::EmptyMessage);
        }
        if !session.phase().is_idle() {
            return Err(SendRejection::Busy);
        }
        let snapshot = self
            .guard
            .snapshot()
            .filter(|snapshot| snapshot.conversation_id() == conversation_id)
            .ok_or(SendRejection::NoConversation)?;
        let permit = self
            .gate
            .try_acquire(conversation_id)
            .ok_or(SendRejection::Busy)?;

        let user_message = session
            .begin_send(text)
            .map_err(|e| match e {
                DomainError::UnreconciledMessages { .. } => SendRejection::Unreconciled,
                DomainError::EmptyMessage => SendRejection::EmptyMessage,
                _ => SendRejection::Busy,
            })?
            .clone();

        self.emit_messages(session);
        self.emit(UiEvent::InputCleared);
        self.emit_phase(conversation_id, SessionPhase::Sending);

        self.conversation_logger.log(ConversationEvent::new(
            "user_message",
            serde_json::json!({
                "conversation_id": conversation_id,
                "temporary_id": user_message.id.to_string(),
                "content": user_message.content,
            }),
        ));

        Ok((snapshot, permit))
    }

    async fn run_cycle(&self, snapshot: &IdentitySnapshot, text: &str) -> SendOutcome {
        let conversation_id = snapshot.conversation_id();

        let mut stream = match self.api.stream_chat(conversation_id, text).await {
            Ok(stream) => stream,
            Err(e) => return self.roll_back(snapshot, e),
        };

        let mut superseded = false;
        let mut deltas = 0usize;
        while let Some(item) = stream.next().await {
            match item {
                Ok(_) if superseded => {}
                Ok(delta) => {
                    deltas += 1;
                    if self.apply_delta(snapshot, &delta).is_none() {
                        superseded = true;
                    }
                }
                Err(e) if superseded => {
                    debug!("Stale stream for conversation {} ended: {}", conversation_id, e);
                    return SendOutcome::Superseded;
                }
                Err(e) => return self.roll_back(snapshot, e),
            }
        }

        if superseded {
            return SendOutcome::Superseded;
        }
        debug!(
            "Stream for conversation {} complete ({} deltas)",
            conversation_id, deltas
        );

        if self.finish_stream(snapshot).is_none() {
            return SendOutcome::Superseded;
        }

        let fetched = self.reconciler.reconcile(conversation_id).await;
        self.apply_reconciliation(snapshot, fetched)
            .unwrap_or(SendOutcome::Superseded)
    }

    fn apply_delta(&self, snapshot: &IdentitySnapshot, delta: &str) -> Option<()> {
        self.with_active_session(snapshot, |session| {
            let first = session.phase() == SessionPhase::Sending;
            match session.apply_delta(delta) {
                Ok(buffer) => {
                    let content = buffer.to_string();
                    if first {
                        self.emit_phase(session.conversation_id(), SessionPhase::Streaming);
                    }
                    trace!("Delta applied ({} bytes buffered)", content.len());
                    self.emit(UiEvent::StreamingUpdated {
                        conversation_id: session.conversation_id(),
                        content,
                    });
                }
                Err(e) => warn!("Dropping delta: {}", e),
            }
        })
    }

    fn finish_stream(&self, snapshot: &IdentitySnapshot) -> Option<()> {
        self.with_active_session(snapshot, |session| match session.finish_stream().cloned() {
            Ok(assistant) => {
                self.conversation_logger.log(ConversationEvent::new(
                    "assistant_response",
                    serde_json::json!({
                        "conversation_id": session.conversation_id(),
                        "temporary_id": assistant.id.to_string(),
                        "content": assistant.content,
                    }),
                ));
                self.emit_messages(session);
                self.emit_phase(session.conversation_id(), SessionPhase::Reconciling);
            }
            Err(e) => warn!("Could not finalize stream: {}", e),
        })
    }

    fn apply_reconciliation(
        &self,
        snapshot: &IdentitySnapshot,
        fetched: Result<Vec<Message>, ApiError>,
    ) -> Option<SendOutcome> {
        self.with_active_session(snapshot, |session| {
            let conversation_id = session.conversation_id();
            let error = match fetched {
                Ok(messages) => match session.reconcile(messages) {
                    Ok(preserved) => {
                        if !preserved {
                            warn!(
                                "Authoritative text for conversation {} differs from what was displayed",
                                conversation_id
                            );
                        }
                        self.conversation_logger.log(ConversationEvent::new(
                            "reconciled",
                            serde_json::json!({
                                "conversation_id": conversation_id,
                                "messages": session.messages().len(),
                                "text_preserved": preserved,
                            }),
                        ));
                        self.emit_messages(session);
                        self.emit_phase(conversation_id, SessionPhase::Idle);
                        return SendOutcome::Delivered { reconciled: true };
                    }
                    Err(e) => ApiError::Decode(e.to_string()),
                },
                Err(e) => e,
            };

            // The answer stays on screen under its temporary id.
            warn!(
                "Reconciliation failed for conversation {}: {}",
                conversation_id, error
            );
            if let Err(e) = session.abandon_reconcile() {
                warn!("Could not leave reconciling phase: {}", e);
            }
            self.conversation_logger.log(ConversationEvent::new(
                "reconcile_failed",
                serde_json::json!({
                    "conversation_id": conversation_id,
                    "error": error.to_string(),
                }),
            ));
            self.emit(UiEvent::ReconcileFailed {
                conversation_id,
                message: error.user_message(&self.config.reconcile_failure_message),
            });
            self.emit_phase(conversation_id, SessionPhase::Idle);
            SendOutcome::Delivered { reconciled: false }
        })
    }

    /// Remove the optimistic user message and surface the failure.
    fn roll_back(&self, snapshot: &IdentitySnapshot, error: ApiError) -> SendOutcome {
        let message = error.user_message(&self.config.failure_message);
        warn!(
            "Send to conversation {} failed: {}",
            snapshot.conversation_id(),
            error
        );

        self.with_active_session(snapshot, |session| {
            let conversation_id = session.conversation_id();
            match session.rollback() {
                Ok(removed) => {
                    self.conversation_logger.log(ConversationEvent::new(
                        "send_rolled_back",
                        serde_json::json!({
                            "conversation_id": conversation_id,
                            "temporary_id": removed.id.to_string(),
                            "error": error.to_string(),
                        }),
                    ));
                    self.emit_messages(session);
                }
                Err(e) => warn!("Rollback skipped: {}", e),
            }
            self.emit_phase(conversation_id, SessionPhase::Idle);
            self.emit(UiEvent::SendFailed {
                conversation_id,
                message: message.clone(),
            });
            SendOutcome::Failed { message }
        })
        .unwrap_or(SendOutcome::Superseded)
    }

    // ==================== Helpers ====================

    fn lock_state(&self) -> MutexGuard<'_, Option<ConversationSession>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the active session if `snapshot` still holds authority.
    ///
    /// The identity check and the mutation happen under one lock, so a
    /// switch cannot slip in between them. Returns `None` for stale callers.
    fn with_active_session<R>(
        &self,
        snapshot: &IdentitySnapshot,
        f: impl FnOnce(&mut ConversationSession) -> R,
    ) -> Option<R> {
        let mut state = self.lock_state();
        if !self.guard.is_still_active(snapshot) {
            return None;
        }
        state
            .as_mut()
            .filter(|session| session.conversation_id() == snapshot.conversation_id())
            .map(f)
    }

    fn emit(&self, event: UiEvent) {
        // A closed receiver means the UI is gone; nothing left to notify.
        let _ = self.tx.send(event);
    }

    fn emit_messages(&self, session: &ConversationSession) {
        self.emit(UiEvent::MessagesChanged {
            conversation_id: session.conversation_id(),
            messages: session.messages().to_vec(),
        });
    }

    fn emit_phase(&self, conversation_id: ConversationId, phase: SessionPhase) {
        debug!("Conversation {} -> {}", conversation_id, phase);
        self.emit(UiEvent::PhaseChanged {
            conversation_id,
            phase,
        });
    }
}
