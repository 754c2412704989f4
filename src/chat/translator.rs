//! Stored turns to request history for the chat service

use super::store::{Role, Turn};
use crate::llm::{ExternalRole, HistoryEntry};

/// Map a stored role onto the external vocabulary
pub fn external_role(role: Role) -> ExternalRole {
    match role {
        Role::User => ExternalRole::User,
        Role::Assistant => ExternalRole::Model,
    }
}

/// Translate stored turns into request history.
///
/// The first turn is always the seeded greeting and is skipped, so the result
/// has exactly `turns.len() - 1` entries (or none for an empty slice).
pub fn to_history(turns: &[Turn]) -> Vec<HistoryEntry> {
    turns
        .iter()
        .skip(1)
        .map(|turn| HistoryEntry {
            role: external_role(turn.role()),
            text: turn.content().to_string(),
        })
        .collect()
}
