use crate::chat::{ConversationState, TurnExecutor, TurnOutcome};
use crate::config::Config;
use anyhow::{bail, Result};

/// Run a single turn against a fresh conversation and return the reply
pub async fn ask(config: &Config, executor: &TurnExecutor, question: &str) -> Result<String> {
    let mut state = ConversationState::new(config.greeting.clone());
    state.set_text(question);

    match executor.submit(&mut state).await {
        TurnOutcome::Succeeded { reply } => Ok(reply),
        TurnOutcome::Failed { notification } => {
            bail!("{}: {}", notification.title, notification.description)
        }
        TurnOutcome::Ignored => bail!("Nothing to ask: the question is empty"),
    }
}
