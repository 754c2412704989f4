//! Conversation store, request translation and turn execution

pub mod executor;
pub mod store;
pub mod translator;

pub use executor::{ChatError, Notification, Severity, Submission, TurnExecutor, TurnOutcome};
pub use store::{ConversationState, Role, Turn, TurnPhase};
