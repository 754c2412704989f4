use crate::chat::ConversationState;
use crate::ui::conversation::commands::{parse_slash_command, SlashCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    /// Enter on sendable text; the text is still in the pending-input slot
    Submit,
    Command(SlashCommand),
    None,
}

/// Single-line input bound to the conversation's pending-input slot.
///
/// The composer owns only the cursor; the text itself lives in
/// [`ConversationState`] so the executor can clear it on send.
#[derive(Debug, Clone, Default)]
pub struct ConversationComposer {
    /// Cursor position in chars, not bytes
    cursor: usize,
}

impl ConversationComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent, state: &mut ConversationState) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }
        self.clamp(state);

        match key.code {
            KeyCode::Enter => {
                let text = state.current_text();
                if let Some(command) = parse_slash_command(text) {
                    state.set_text(String::new());
                    self.cursor = 0;
                    return ComposerResult::Command(command);
                }
                if state.can_submit() {
                    return ComposerResult::Submit;
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_str(state, &c.to_string());
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_at(state, self.cursor);
                }
            }
            KeyCode::Delete => {
                if self.cursor < char_len(state.current_text()) {
                    self.remove_at(state, self.cursor);
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(char_len(state.current_text()));
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = char_len(state.current_text());
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text at the cursor. Line breaks become spaces; the input is single-line.
    pub fn handle_paste(&mut self, text: &str, state: &mut ConversationState) {
        self.clamp(state);
        let flattened: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        self.insert_str(state, &flattened);
    }

    /// Keep the cursor inside the text after it was changed elsewhere
    fn clamp(&mut self, state: &ConversationState) {
        self.cursor = self.cursor.min(char_len(state.current_text()));
    }

    fn insert_str(&mut self, state: &mut ConversationState, s: &str) {
        let mut text = state.current_text().to_string();
        text.insert_str(byte_offset(&text, self.cursor), s);
        self.cursor += char_len(s);
        state.set_text(text);
    }

    fn remove_at(&mut self, state: &mut ConversationState, char_index: usize) {
        let mut text = state.current_text().to_string();
        text.remove(byte_offset(&text, char_index));
        state.set_text(text);
    }

    /// Widget view of the composer for one frame
    pub fn view<'a>(&'a self, state: &'a ConversationState) -> ComposerView<'a> {
        ComposerView { composer: self, state }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn byte_offset(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct ComposerView<'a> {
    composer: &'a ConversationComposer,
    state: &'a ConversationState,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let awaiting = self.state.is_awaiting_response();
        let (title, border) = if awaiting {
            ("⏳ Waiting for the assistant...", Color::DarkGray)
        } else if self.state.can_submit() {
            ("💬 Ask about parts, builds or compatibility (Enter to send)", Color::Green)
        } else {
            ("💬 Ask about parts, builds or compatibility", Color::Gray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(Style::default().fg(border));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let text = self.state.current_text();
        if text.is_empty() {
            let placeholder = Line::from(vec![Span::styled(
                "Type your question... (/help for commands)",
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder, inner_area.width);
            return;
        }

        let mut content = text.to_string();
        if !awaiting {
            content.insert(byte_offset(&content, self.composer.cursor), '▌');
        }

        // Keep the cursor visible on long input
        let width = inner_area.width as usize;
        let cursor = self.composer.cursor.min(char_len(&content));
        let skip = (cursor + 1).saturating_sub(width);
        let visible: String = content.chars().skip(skip).collect();

        let line = Line::from(vec![Span::styled(visible, Style::default().fg(Color::White))]);
        buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
    }
}
