//! Conversation UI components for the chat screen

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;
pub mod notifications;
pub mod thinking;

pub use commands::{get_help_text, SlashCommand};
pub use composer::{ComposerResult, ConversationComposer};
pub use history::ConversationHistory;
pub use manager::{ConversationAction, ConversationManager};
pub use notifications::NotificationCenter;
pub use thinking::ThinkingIndicator;
