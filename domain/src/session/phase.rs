//! Send cycle phases for a conversation session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a conversation session's send cycle (Value Object)
///
/// ```text
/// Idle → Sending → Streaming → Reconciling → Idle
///           │          │
///           └──────────┴──→ Idle   (rollback on transport failure)
/// ```
///
/// `Sending → Reconciling` is allowed for a stream that ends before any delta
/// arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Sending,
    Streaming,
    Reconciling,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Sending => "sending",
            SessionPhase::Streaming => "streaming",
            SessionPhase::Reconciling => "reconciling",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionPhase::Idle)
    }

    /// Whether a network request is outstanding in this phase.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SessionPhase::Sending | SessionPhase::Streaming)
    }

    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, next),
            (Idle, Sending)
                | (Sending, Streaming)
                | (Sending, Reconciling)
                | (Streaming, Streaming)
                | (Streaming, Reconciling)
                | (Sending, Idle)
                | (Streaming, Idle)
                | (Reconciling, Idle)
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
