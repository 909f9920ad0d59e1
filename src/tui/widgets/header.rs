//! Header widget: title, summary percentages, refresh indicator

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::config::EndpointConfig;
use crate::services::summary::{summary_entries, SummaryEntry};
use crate::types::RefreshState;

use super::level_color;

/// Spinner animation frames
const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// App branding
const APP_NAME: &str = "quotrack";

/// Two-row header: title plus summary line, then a separator rule
pub struct Header<'a> {
    state: &'a RefreshState,
    endpoints: &'a [EndpointConfig],
    spinner_frame: usize,
}

impl<'a> Header<'a> {
    pub fn new(
        state: &'a RefreshState,
        endpoints: &'a [EndpointConfig],
        spinner_frame: usize,
    ) -> Self {
        Self {
            state,
            endpoints,
            spinner_frame,
        }
    }

    fn summary_spans(entries: &[SummaryEntry]) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
            }
            spans.push(Span::styled(
                format!("{} {}%", entry.name, entry.percent),
                Style::default()
                    .fg(level_color(entry.level))
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans
    }

    fn status_text(&self) -> String {
        if self.state.refreshing {
            let frame = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];
            format!("{frame} refreshing")
        } else if let Some(at) = self.state.last_refresh() {
            format!("updated {}", at.with_timezone(&Local).format("%H:%M"))
        } else {
            String::new()
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let mut spans = vec![Span::styled(
            APP_NAME,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(result) = &self.state.result {
            let entries = summary_entries(self.endpoints, result);
            if !entries.is_empty() {
                spans.push(Span::raw("   "));
                spans.extend(Self::summary_spans(&entries));
            }
        }
        buf.set_line(
            area.x + 1,
            area.y,
            &Line::from(spans),
            area.width.saturating_sub(2),
        );

        let status = self.status_text();
        if !status.is_empty() {
            let width = status.chars().count() as u16;
            if area.width > width + 1 {
                buf.set_string(
                    area.right().saturating_sub(width + 1),
                    area.y,
                    &status,
                    Style::default().fg(Color::DarkGray),
                );
            }
        }

        if area.height > 1 {
            let rule = "─".repeat(area.width as usize);
            buf.set_string(
                area.x,
                area.y + 1,
                rule,
                Style::default().fg(Color::DarkGray),
            );
        }
    }
}
