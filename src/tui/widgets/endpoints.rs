//! Endpoint cards: per-endpoint usage detail or error

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Widget},
};

use crate::services::summary::UsageLevel;
use crate::types::{ApiStatsData, RefreshState, UsageSnapshot};

use super::level_color;

/// Rows per endpoint card, border included
const CARD_HEIGHT: u16 = 6;

/// Scrollable stack of per-endpoint cards
pub struct EndpointList<'a> {
    state: &'a RefreshState,
    scroll: usize,
}

impl<'a> EndpointList<'a> {
    pub fn new(state: &'a RefreshState, scroll: usize) -> Self {
        Self { state, scroll }
    }
}

impl Widget for EndpointList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let Some(result) = &self.state.result else {
            render_centered(area, buf, &["Loading..."]);
            return;
        };

        if result.snapshots.is_empty() {
            render_centered(
                area,
                buf,
                &[
                    "No endpoints configured",
                    "",
                    "quotrack endpoints add <name> <base-url> <api-id>",
                ],
            );
            return;
        }

        let mut y = area.y;
        for snapshot in result.snapshots.iter().skip(self.scroll) {
            if y >= area.bottom() {
                break;
            }
            let height = CARD_HEIGHT.min(area.bottom() - y);
            render_card(
                snapshot,
                Rect {
                    x: area.x,
                    y,
                    width: area.width,
                    height,
                },
                buf,
            );
            y += CARD_HEIGHT;
        }
    }
}

fn render_card(snapshot: &UsageSnapshot, area: Rect, buf: &mut Buffer) {
    let (mark, mark_style) = status_mark(snapshot);
    let block = Block::default().borders(Borders::ALL).title(Line::from(vec![
        Span::styled(
            format!(" {} ", snapshot.endpoint_name),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{mark} "), mark_style),
    ]));
    let inner = block.inner(area);
    block.render(area, buf);
    if inner.height == 0 {
        return;
    }

    if let Some(error) = &snapshot.error {
        buf.set_line(
            inner.x + 1,
            inner.y,
            &Line::from(Span::styled(
                error.as_str(),
                Style::default().fg(Color::Red),
            )),
            inner.width.saturating_sub(1),
        );
        return;
    }
    let Some(stats) = &snapshot.stats else {
        return;
    };

    let rows = Layout::vertical([
        Constraint::Length(1), // costs
        Constraint::Length(1), // daily limit gauge
        Constraint::Length(1), // tokens
        Constraint::Length(1), // meta
    ])
    .split(inner);

    let costs = Line::from(vec![
        Span::styled("total ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            stats.usage.total.formatted_cost.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled("   today ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("${:.2}", stats.limits.current_daily_cost),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    set_row(buf, rows[0], &costs);

    match snapshot.daily_cost_fraction() {
        Some(fraction) => {
            let gauge_area = Rect {
                x: rows[1].x + 1,
                width: rows[1].width.saturating_sub(2),
                ..rows[1]
            };
            Gauge::default()
                .ratio(fraction)
                .label(format!(
                    "${:.2} / ${:.0}",
                    stats.limits.current_daily_cost, stats.limits.daily_cost_limit
                ))
                .gauge_style(
                    Style::default().fg(level_color(UsageLevel::from_fraction(fraction))),
                )
                .render(gauge_area, buf);
        }
        None => {
            let line = Line::from(Span::styled(
                "no daily limit",
                Style::default().fg(Color::DarkGray),
            ));
            set_row(buf, rows[1], &line);
        }
    }

    let tokens = Line::from(vec![
        Span::styled("tokens ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_number(stats.usage.total.all_tokens)),
        Span::styled("   today ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_number(snapshot.daily_tokens)),
    ]);
    set_row(buf, rows[2], &tokens);

    let mut meta = format!("concurrency {}", stats.limits.concurrency_limit);
    if let Some(expiry) = remaining_days_text(stats, Utc::now()) {
        meta.push_str(" · ");
        meta.push_str(&expiry);
    }
    let meta_line = Line::from(Span::styled(meta, Style::default().fg(Color::DarkGray)));
    set_row(buf, rows[3], &meta_line);
}

fn status_mark(snapshot: &UsageSnapshot) -> (&'static str, Style) {
    match (&snapshot.stats, &snapshot.error) {
        (_, Some(_)) => ("✗", Style::default().fg(Color::Red)),
        (Some(stats), _) if stats.is_active => ("✓", Style::default().fg(Color::Green)),
        _ => ("○", Style::default().fg(Color::DarkGray)),
    }
}

fn set_row(buf: &mut Buffer, row: Rect, line: &Line) {
    if row.height > 0 {
        buf.set_line(row.x + 1, row.y, line, row.width.saturating_sub(1));
    }
}

fn render_centered(area: Rect, buf: &mut Buffer, lines: &[&str]) {
    let style = Style::default().fg(Color::DarkGray);
    let top = area.y + area.height.saturating_sub(lines.len() as u16) / 2;
    for (i, text) in lines.iter().enumerate() {
        let y = top + i as u16;
        if y >= area.bottom() {
            break;
        }
        let width = text.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(width) / 2;
        buf.set_string(x, y, text, style);
    }
}

/// Compact count formatting (1.2K, 3.4M, 5.6B)
pub(crate) fn format_number(num: u64) -> String {
    if num >= 1_000_000_000 {
        format!("{:.1}B", num as f64 / 1_000_000_000.0)
    } else if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

/// Human expiry countdown from the remote expiry timestamp
pub(crate) fn remaining_days_text(stats: &ApiStatsData, now: DateTime<Utc>) -> Option<String> {
    let expires = stats.expires_at_parsed()?.with_timezone(&Utc);
    let days = (expires - now).num_days();
    Some(if (expires - now).num_seconds() < 0 {
        "expired".to_string()
    } else if days == 0 {
        "expires today".to_string()
    } else if days == 1 {
        "1 day left".to_string()
    } else {
        format!("{days} days left")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LimitsData, TotalUsage, UsageData};
    use chrono::TimeZone;

    fn stats_expiring(expires_at: &str) -> ApiStatsData {
        ApiStatsData {
            id: "key-1".into(),
            name: "alpha".into(),
            description: None,
            is_active: true,
            created_at: "2025-01-01T00:00:00Z".into(),
            expires_at: expires_at.into(),
            expiration_mode: "fixed".into(),
            is_activated: true,
            activation_days: None,
            activated_at: None,
            permissions: None,
            usage: UsageData {
                total: TotalUsage {
                    tokens: 0,
                    input_tokens: 0,
                    output_tokens: 0,
                    cache_create_tokens: 0,
                    cache_read_tokens: 0,
                    all_tokens: 0,
                    requests: 0,
                    cost: 0.0,
                    formatted_cost: "$0.00".into(),
                },
            },
            limits: LimitsData {
                token_limit: 0,
                concurrency_limit: 1,
                rate_limit_window: 0,
                rate_limit_requests: 0,
                rate_limit_cost: 0,
                daily_cost_limit: 0.0,
                total_cost_limit: 0.0,
                weekly_opus_cost_limit: 0.0,
                current_window_requests: 0,
                current_window_tokens: 0,
                current_window_cost: 0.0,
                current_daily_cost: 0.0,
                current_total_cost: 0.0,
                weekly_opus_cost: 0.0,
            },
        }
    }

    // ========== format_number tests ==========

    #[test]
    fn test_format_number_plain() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
    }

    #[test]
    fn test_format_number_scaled() {
        assert_eq!(format_number(1_200), "1.2K");
        assert_eq!(format_number(3_400_000), "3.4M");
        assert_eq!(format_number(5_600_000_000), "5.6B");
    }

    // ========== remaining_days_text tests ==========

    #[test]
    fn test_remaining_days() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

        let stats = stats_expiring("2025-07-01T12:00:00Z");
        assert_eq!(
            remaining_days_text(&stats, now).unwrap(),
            "30 days left"
        );

        let stats = stats_expiring("2025-06-02T13:00:00Z");
        assert_eq!(remaining_days_text(&stats, now).unwrap(), "1 day left");

        let stats = stats_expiring("2025-06-01T18:00:00Z");
        assert_eq!(
            remaining_days_text(&stats, now).unwrap(),
            "expires today"
        );

        let stats = stats_expiring("2025-05-01T00:00:00Z");
        assert_eq!(remaining_days_text(&stats, now).unwrap(), "expired");
    }

    #[test]
    fn test_remaining_days_unparseable() {
        let now = Utc::now();
        let stats = stats_expiring("never");
        assert!(remaining_days_text(&stats, now).is_none());
    }
}
