//! In-memory conversation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Where the conversation is in its request cycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    /// One request is outstanding for `prompt`
    Sending { prompt: String },
}

/// Ordered turns plus the pending-input slot and the request phase.
///
/// Append-only: there is no way to remove or edit a turn once stored.
#[derive(Debug, Clone)]
pub struct ConversationState {
    turns: Vec<Turn>,
    pending_input: String,
    phase: TurnPhase,
}

impl ConversationState {
    /// Start a conversation seeded with the assistant greeting
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::assistant(greeting)],
            pending_input: String::new(),
            phase: TurnPhase::Idle,
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn current_text(&self) -> &str {
        &self.pending_input
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: TurnPhase) {
        self.phase = phase;
    }

    pub fn is_awaiting_response(&self) -> bool {
        matches!(self.phase, TurnPhase::Sending { .. })
    }

    /// Whether the composer may submit right now
    pub fn can_submit(&self) -> bool {
        !self.is_awaiting_response() && !self.pending_input.trim().is_empty()
    }
}
