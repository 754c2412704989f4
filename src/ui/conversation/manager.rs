use crate::chat::{ChatError, ConversationState, Notification, Submission, TurnExecutor, TurnOutcome};
use crate::config::Config;
use crate::events::AppEvent;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, NotificationCenter, SlashCommand,
    ThinkingIndicator,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};
use tokio::sync::mpsc;
use tracing::Instrument;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Owns the conversation for one session and wires it to the UI components
pub struct ConversationManager {
    state: ConversationState,
    executor: TurnExecutor,
    composer: ConversationComposer,
    history: ConversationHistory,
    thinking: ThinkingIndicator,
    notifications: NotificationCenter,
    events: mpsc::UnboundedSender<AppEvent>,
    show_timestamps: bool,
}

impl ConversationManager {
    pub fn new(config: &Config, executor: TurnExecutor, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            state: ConversationState::new(config.greeting.clone()),
            executor,
            composer: ConversationComposer::new(),
            history: ConversationHistory::new(),
            thinking: ThinkingIndicator::new(),
            notifications: NotificationCenter::new(config.ui.notification_ticks),
            events,
            show_timestamps: config.ui.show_timestamps,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return ConversationAction::Exit,
            KeyCode::Char('c') | KeyCode::Char('d') if ctrl => return ConversationAction::Exit,
            KeyCode::PageUp => {
                self.history.page_up();
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.history.page_down();
                return ConversationAction::None;
            }
            KeyCode::Up => {
                self.history.scroll_up(1);
                return ConversationAction::None;
            }
            KeyCode::Down => {
                self.history.scroll_down(1);
                return ConversationAction::None;
            }
            _ => {}
        }

        match self.composer.handle_key(key, &mut self.state) {
            ComposerResult::Submit => {
                self.submit();
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.composer.handle_paste(text, &mut self.state);
    }

    pub fn on_tick(&mut self) {
        self.notifications.tick();
        if self.state.is_awaiting_response() {
            self.thinking.tick();
        }
    }

    /// Start a turn; the network call runs on its own task and reports back as
    /// [`AppEvent::TurnResolved`].
    pub fn submit(&mut self) {
        match self.executor.begin(&mut self.state) {
            Submission::Ignored => {}
            Submission::Rejected(notification) => self.notifications.push(notification),
            Submission::Accepted(pending) => {
                self.history.scroll_to_bottom();
                let call = self.executor.dispatch(pending);
                let events = self.events.clone();
                tokio::spawn(
                    async move {
                        let result = call.await;
                        if events.send(AppEvent::TurnResolved(result)).is_err() {
                            tracing::debug!("session closed before the turn resolved; result discarded");
                        }
                    }
                    .in_current_span(),
                );
            }
        }
    }

    /// Apply a completed request
    pub fn on_turn_resolved(&mut self, result: Result<String, ChatError>) {
        match self.executor.finish(&mut self.state, result) {
            TurnOutcome::Failed { notification } => self.notifications.push(notification),
            TurnOutcome::Succeeded { .. } => self.history.scroll_to_bottom(),
            TurnOutcome::Ignored => {}
        }
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: SlashCommand) -> ConversationAction {
        match command {
            SlashCommand::Bye => ConversationAction::Exit,
            SlashCommand::Help => {
                self.notifications.push(Notification::info("Help", get_help_text()));
                ConversationAction::None
            }
            SlashCommand::Model => {
                self.notifications.push(Notification::info(
                    "Model",
                    format!("Answers come from {}", self.executor.model_id()),
                ));
                ConversationAction::None
            }
        }
    }
}

impl Widget for &mut ConversationManager {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // History takes most space, thinking line and composer at the bottom
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1), Constraint::Length(3)])
            .split(area);

        self.history
            .view(self.state.turns(), self.show_timestamps)
            .render(chunks[0], buf);

        if self.state.is_awaiting_response() {
            (&self.thinking).render(chunks[1], buf);
        }

        self.composer.view(&self.state).render(chunks[2], buf);

        if !self.notifications.is_empty() {
            (&self.notifications).render(chunks[0], buf);
        }
    }
}
