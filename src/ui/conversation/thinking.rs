use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Animated "thinking" line shown while a request is outstanding
#[derive(Debug, Clone, Default)]
pub struct ThinkingIndicator {
    frame: usize,
}

impl ThinkingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the animation by one tick
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    fn dots(&self) -> &'static str {
        match self.frame % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        }
    }
}

impl Widget for &ThinkingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let indicator = Line::from(vec![
            Span::styled("🤖 ", Style::default().fg(Color::Green)),
            Span::styled("Assistant is thinking", Style::default().fg(Color::Green)),
            Span::styled(self.dots(), Style::default().fg(Color::Yellow)),
        ]);
        buf.set_line(area.x, area.y, &indicator, area.width);
    }
}
