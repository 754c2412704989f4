//! Conversation history display component

use crate::chat::{Role, Turn};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget},
};

/// Scroll position of the history pane, counted in lines up from the bottom
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    offset_from_bottom: usize,
    page: usize,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_sub(lines);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.page.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.page.max(1));
    }

    /// Snap to the newest turn
    pub fn scroll_to_bottom(&mut self) {
        self.offset_from_bottom = 0;
    }

    pub fn view<'a>(&'a mut self, turns: &'a [Turn], show_timestamps: bool) -> HistoryView<'a> {
        HistoryView {
            history: self,
            turns,
            show_timestamps,
        }
    }
}

pub struct HistoryView<'a> {
    history: &'a mut ConversationHistory,
    turns: &'a [Turn],
    show_timestamps: bool,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("🤖 ArcaneRigs Assistant");

        let inner_area = block.inner(area);
        block.render(area, buf);

        let mut all_lines: Vec<Line> = Vec::new();
        for turn in self.turns {
            all_lines.extend(render_turn(turn, inner_area.width, self.show_timestamps));
            // spacing between turns
            all_lines.push(Line::from(""));
        }
        all_lines.pop();

        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_offset = total.saturating_sub(height);

        self.history.page = height.saturating_sub(1);
        self.history.offset_from_bottom = self.history.offset_from_bottom.min(max_offset);

        let start = max_offset - self.history.offset_from_bottom;
        for (i, line) in all_lines.iter().skip(start).take(height).enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }

        if max_offset > 0 {
            let mut scroll_state = ScrollbarState::new(max_offset).position(start);
            Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .render(area, buf, &mut scroll_state);
        }
    }
}

/// Render a single turn into lines
fn render_turn(turn: &Turn, width: u16, show_timestamps: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let (label, color) = match turn.role() {
        Role::User => ("👤 You", Color::Blue),
        Role::Assistant => ("🤖 Assistant", Color::Green),
    };

    let mut header = vec![Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))];
    if show_timestamps {
        let timestamp = turn.created_at().with_timezone(&chrono::Local).format("%H:%M:%S");
        header.push(Span::styled(format!(" {}", timestamp), Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::from(header));

    let tab = " ".repeat(TAB_WIDTH);
    for content_line in wrap_text(turn.content(), width.saturating_sub(2) as usize) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(content_line.replace('\t', &tab), Style::default().fg(color)),
        ]));
    }

    lines
}

/// Columns a tab occupies on screen
const TAB_WIDTH: usize = 4;

fn column_width(c: char) -> usize {
    if c == '\t' { TAB_WIDTH } else { 1 }
}

/// Split a line into alternating runs of whitespace and non-whitespace
fn runs(line: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut previous: Option<bool> = None;
    for (i, c) in line.char_indices() {
        let blank = c.is_whitespace();
        if previous.is_some_and(|p| p != blank) {
            runs.push(&line[start..i]);
            start = i;
        }
        previous = Some(blank);
    }
    if start < line.len() {
        runs.push(&line[start..]);
    }
    runs
}

/// Wrap text to `width` columns. Explicit line breaks, blank lines and
/// whitespace inside a line are kept as-is; only the whitespace a soft
/// break lands on is dropped.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.split('\n').map(|line| line.trim_end_matches('\r').to_string()).collect();
    }

    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        let raw_line = raw_line.trim_end_matches('\r');
        let mut current = String::new();
        let mut columns = 0;

        for run in runs(raw_line) {
            let run_width: usize = run.chars().map(column_width).sum();
            if columns + run_width <= width {
                current.push_str(run);
                columns += run_width;
                continue;
            }

            if run.starts_with(char::is_whitespace) {
                lines.push(current.trim_end().to_string());
                current.clear();
                columns = 0;
                continue;
            }

            if !current.trim().is_empty() {
                lines.push(current.trim_end().to_string());
                current.clear();
                columns = 0;
            }

            // Words longer than a line are hard-split
            for c in run.chars() {
                let w = column_width(c);
                if columns > 0 && columns + w > width {
                    lines.push(std::mem::take(&mut current));
                    columns = 0;
                }
                current.push(c);
                columns += w;
            }
        }

        lines.push(current);
    }

    lines
}
