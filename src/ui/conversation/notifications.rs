use crate::chat::{Notification, Severity};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
struct Toast {
    notification: Notification,
    ticks_left: u16,
}

/// Short-lived toasts shown over the top-right corner of the screen
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    toasts: VecDeque<Toast>,
    lifetime_ticks: u16,
}

impl NotificationCenter {
    const MAX_VISIBLE: usize = 3;

    pub fn new(lifetime_ticks: u16) -> Self {
        Self {
            toasts: VecDeque::new(),
            lifetime_ticks: lifetime_ticks.max(1),
        }
    }

    pub fn push(&mut self, notification: Notification) {
        self.toasts.push_back(Toast {
            notification,
            ticks_left: self.lifetime_ticks,
        });
        while self.toasts.len() > Self::MAX_VISIBLE {
            self.toasts.pop_front();
        }
    }

    /// Age every toast by one tick and drop the expired ones
    pub fn tick(&mut self) {
        for toast in self.toasts.iter_mut() {
            toast.ticks_left = toast.ticks_left.saturating_sub(1);
        }
        self.toasts.retain(|toast| toast.ticks_left > 0);
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    #[cfg(test)]
    pub fn latest(&self) -> Option<&Notification> {
        self.toasts.back().map(|toast| &toast.notification)
    }
}

impl Widget for &NotificationCenter {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = area.width.min(48);
        let mut y = area.y;

        for toast in self.toasts.iter().rev() {
            let n = &toast.notification;
            let color = match n.severity {
                Severity::Info => Color::Cyan,
                Severity::Error => Color::Red,
            };
            let inner_width = width.saturating_sub(2).max(1) as usize;
            let body_lines: usize = n
                .description
                .lines()
                .map(|line| line.chars().count() / inner_width + 1)
                .sum();
            let body_lines = body_lines.min(u16::MAX as usize) as u16;
            let height = (body_lines + 2).min(area.bottom().saturating_sub(y));
            if height < 3 {
                break;
            }

            let toast_area = Rect {
                x: area.right().saturating_sub(width),
                y,
                width,
                height,
            };
            Clear.render(toast_area, buf);
            Paragraph::new(n.description.clone())
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color))
                        .title(Span::styled(
                            n.title.clone(),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        )),
                )
                .render(toast_area, buf);

            y = y.saturating_add(height);
        }
    }
}
