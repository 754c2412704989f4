use crate::chat::{TurnExecutor, TurnPhase};
use crate::config::Config;
use crate::events::{AppEvent, EventHandler};
use crate::tui::{self, Tui};
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::Result;
use std::time::Duration;

const TICK_RATE: Duration = Duration::from_millis(300);

/// Run the chat screen until the user quits
pub async fn run(config: &Config, executor: TurnExecutor) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = event_loop(&mut terminal, config, executor).await;

    tui::restore()?;
    result
}

async fn event_loop(terminal: &mut Tui, config: &Config, executor: TurnExecutor) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);
    let mut manager = ConversationManager::new(config, executor, events.sender());
    tracing::info!("chat screen opened");

    loop {
        terminal.draw(|frame| {
            let area = frame.size();
            frame.render_widget(&mut manager, area);
        })?;

        let Some(event) = events.next().await else {
            break;
        };

        match event {
            AppEvent::Key(key) => {
                if manager.handle_key(key) == ConversationAction::Exit {
                    break;
                }
            }
            AppEvent::Paste(text) => manager.handle_paste(&text),
            AppEvent::Resize(width, height) => tracing::trace!(width, height, "terminal resized"),
            AppEvent::Tick => manager.on_tick(),
            AppEvent::TurnResolved(result) => manager.on_turn_resolved(result),
        }
    }

    if let TurnPhase::Sending { prompt } = manager.state().phase() {
        tracing::info!(
            prompt_chars = prompt.chars().count(),
            "leaving with a request outstanding; its result will be discarded"
        );
    }
    tracing::info!(turns = manager.state().turns().len(), "chat screen closed");
    Ok(())
}
