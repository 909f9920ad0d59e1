//! Compact summary derivation (the status-line percentages)

use crate::config::EndpointConfig;
use crate::types::RefreshResult;

/// Severity bucket for summary coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

impl UsageLevel {
    /// Above 80% is critical, above 50% warning
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction > 0.8 {
            Self::Critical
        } else if fraction > 0.5 {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

/// One summary slot: endpoint name plus clamped daily-cost percentage
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub name: String,
    pub percent: u8,
    pub level: UsageLevel,
}

/// Derive summary entries for endpoints opted into the compact view.
///
/// Failed endpoints and endpoints without a daily cost limit are omitted;
/// percentages clamp at 100.
pub fn summary_entries(endpoints: &[EndpointConfig], result: &RefreshResult) -> Vec<SummaryEntry> {
    result
        .snapshots
        .iter()
        .filter(|snap| {
            endpoints
                .iter()
                .any(|ep| ep.id == snap.endpoint_id && ep.include_in_summary)
        })
        .filter_map(|snap| {
            let fraction = snap.daily_cost_fraction()?;
            Some(SummaryEntry {
                name: snap.endpoint_name.clone(),
                percent: (fraction * 100.0).round() as u8,
                level: UsageLevel::from_fraction(fraction),
            })
        })
        .collect()
}
