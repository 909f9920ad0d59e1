//! TUI widgets

pub mod endpoints;
pub mod header;

use ratatui::style::Color;

use crate::services::summary::UsageLevel;

/// Severity color mapping shared by the widgets
pub(crate) fn level_color(level: UsageLevel) -> Color {
    match level {
        UsageLevel::Normal => Color::Green,
        UsageLevel::Warning => Color::Yellow,
        UsageLevel::Critical => Color::Red,
    }
}
