//! Per-endpoint snapshots and the published refresh state

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::EndpointConfig;

use super::stats::{ApiStatsData, CombinedStats};

/// Outcome of one endpoint's fetch within a refresh pass.
///
/// Exactly one of `stats` and `error` is populated.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub endpoint_id: Uuid,
    pub endpoint_name: String,
    pub stats: Option<ApiStatsData>,
    pub daily_tokens: u64,
    pub error: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn success(endpoint: &EndpointConfig, combined: CombinedStats) -> Self {
        Self {
            endpoint_id: endpoint.id,
            endpoint_name: endpoint.name.clone(),
            stats: Some(combined.stats),
            daily_tokens: combined.daily_tokens,
            error: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn failure(endpoint: &EndpointConfig, error: String) -> Self {
        Self {
            endpoint_id: endpoint.id,
            endpoint_name: endpoint.name.clone(),
            stats: None,
            daily_tokens: 0,
            error: Some(error),
            fetched_at: Utc::now(),
        }
    }

    /// Fraction of the daily cost limit consumed, clamped to 1.0.
    ///
    /// None when the fetch failed or the endpoint has no daily limit.
    pub fn daily_cost_fraction(&self) -> Option<f64> {
        let limits = &self.stats.as_ref()?.limits;
        if limits.daily_cost_limit > 0.0 {
            Some((limits.current_daily_cost / limits.daily_cost_limit).clamp(0.0, 1.0))
        } else {
            None
        }
    }
}

/// One complete refresh pass over all configured endpoints.
///
/// Snapshots keep the order the endpoint list had when the pass began.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub snapshots: Vec<UsageSnapshot>,
    pub completed_at: DateTime<Utc>,
}

/// Published observable state: the last complete pass plus an in-flight flag.
///
/// Replaced wholesale on every change, so observers never see a partial pass.
#[derive(Debug, Clone, Default)]
pub struct RefreshState {
    pub result: Option<RefreshResult>,
    pub refreshing: bool,
}

impl RefreshState {
    /// Completion time of the last pass, if any has finished yet
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.result.as_ref().map(|r| r.completed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LimitsData, TotalUsage, UsageData};

    fn make_stats(daily_cost_limit: f64, current_daily_cost: f64) -> ApiStatsData {
        ApiStatsData {
            id: "key-1".into(),
            name: "alpha".into(),
            description: None,
            is_active: true,
            created_at: "2025-01-01T00:00:00Z".into(),
            expires_at: "2026-01-01T00:00:00Z".into(),
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
                daily_cost_limit,
                total_cost_limit: 0.0,
                weekly_opus_cost_limit: 0.0,
                current_window_requests: 0,
                current_window_tokens: 0,
                current_window_cost: 0.0,
                current_daily_cost,
                current_total_cost: 0.0,
                weekly_opus_cost: 0.0,
            },
        }
    }

    fn make_snapshot(stats: Option<ApiStatsData>, error: Option<String>) -> UsageSnapshot {
        UsageSnapshot {
            endpoint_id: Uuid::new_v4(),
            endpoint_name: "alpha".into(),
            stats,
            daily_tokens: 0,
            error,
            fetched_at: Utc::now(),
        }
    }

    // ========== daily_cost_fraction tests ==========

    #[test]
    fn test_fraction_within_limit() {
        let snap = make_snapshot(Some(make_stats(100.0, 85.0)), None);
        let fraction = snap.daily_cost_fraction().unwrap();
        assert!((fraction - 0.85).abs() < 1e-10);
    }

    #[test]
    fn test_fraction_clamps_at_one() {
        let snap = make_snapshot(Some(make_stats(100.0, 120.0)), None);
        let fraction = snap.daily_cost_fraction().unwrap();
        assert!((fraction - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fraction_none_without_limit() {
        let snap = make_snapshot(Some(make_stats(0.0, 42.0)), None);
        assert!(snap.daily_cost_fraction().is_none());
    }

    #[test]
    fn test_fraction_none_for_failed_fetch() {
        let snap = make_snapshot(None, Some("request timed out".into()));
        assert!(snap.daily_cost_fraction().is_none());
    }

    // ========== RefreshState tests ==========

    #[test]
    fn test_last_refresh_empty_state() {
        assert!(RefreshState::default().last_refresh().is_none());
    }

    #[test]
    fn test_last_refresh_follows_result() {
        let completed_at = Utc::now();
        let state = RefreshState {
            result: Some(RefreshResult {
                snapshots: Vec::new(),
                completed_at,
            }),
            refreshing: false,
        };
        assert_eq!(state.last_refresh(), Some(completed_at));
    }
}
