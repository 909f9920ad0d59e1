//! Wire types for the relay usage-stats API
//!
//! Payloads are copied verbatim from the remote responses. quotrack treats
//! them as opaque value objects and does not interpret fields beyond display.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Combined outcome of one endpoint's fetch cycle
#[derive(Debug, Clone)]
pub struct CombinedStats {
    pub stats: ApiStatsData,
    pub daily_tokens: u64,
}

/// Response envelope for the user-stats call
#[derive(Debug, Deserialize)]
pub struct UserStatsResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<ApiStatsData>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response envelope for the model-stats call
#[derive(Debug, Deserialize)]
pub struct ModelStatsResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<ModelStatsData>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Account-level payload returned by the user-stats call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatsData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub expires_at: String,
    pub expiration_mode: String,
    pub is_activated: bool,
    #[serde(default)]
    pub activation_days: Option<i64>,
    #[serde(default)]
    pub activated_at: Option<String>,
    #[serde(default)]
    pub permissions: Option<String>,
    pub usage: UsageData,
    pub limits: LimitsData,
}

impl ApiStatsData {
    /// Parsed expiry timestamp; None when the remote string is not RFC 3339
    pub fn expires_at_parsed(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.expires_at).ok()
    }
}

/// Usage block of the user-stats payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageData {
    pub total: TotalUsage,
}

/// Lifetime usage counters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalUsage {
    pub tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_create_tokens: u64,
    pub cache_read_tokens: u64,
    pub all_tokens: u64,
    pub requests: u64,
    pub cost: f64,
    pub formatted_cost: String,
}

/// Quota limits and current consumption
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsData {
    pub token_limit: u64,
    pub concurrency_limit: u32,
    pub rate_limit_window: u32,
    pub rate_limit_requests: u32,
    pub rate_limit_cost: u64,
    pub daily_cost_limit: f64,
    pub total_cost_limit: f64,
    pub weekly_opus_cost_limit: f64,
    pub current_window_requests: u64,
    pub current_window_tokens: u64,
    pub current_window_cost: f64,
    pub current_daily_cost: f64,
    pub current_total_cost: f64,
    pub weekly_opus_cost: f64,
}

/// Per-model break-down returned by the model-stats call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatsData {
    pub model: String,
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_create_tokens: u64,
    pub cache_read_tokens: u64,
    pub all_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats_json() -> serde_json::Value {
        serde_json::json!({
            "id": "key-1",
            "name": "alpha",
            "description": null,
            "isActive": true,
            "createdAt": "2025-01-01T00:00:00.000Z",
            "expiresAt": "2026-01-01T00:00:00.000Z",
            "expirationMode": "fixed",
            "isActivated": true,
            "activationDays": 365,
            "activatedAt": "2025-01-01T00:00:00.000Z",
            "permissions": "all",
            "usage": {
                "total": {
                    "tokens": 1000,
                    "inputTokens": 400,
                    "outputTokens": 300,
                    "cacheCreateTokens": 200,
                    "cacheReadTokens": 100,
                    "allTokens": 1000,
                    "requests": 42,
                    "cost": 12.34,
                    "formattedCost": "$12.34"
                }
            },
            "limits": {
                "tokenLimit": 0,
                "concurrencyLimit": 5,
                "rateLimitWindow": 60,
                "rateLimitRequests": 100,
                "rateLimitCost": 0,
                "dailyCostLimit": 100.0,
                "totalCostLimit": 0.0,
                "weeklyOpusCostLimit": 0.0,
                "currentWindowRequests": 3,
                "currentWindowTokens": 1500,
                "currentWindowCost": 0.12,
                "currentDailyCost": 85.0,
                "currentTotalCost": 12.34,
                "weeklyOpusCost": 0.0
            }
        })
    }

    // ========== decode tests ==========

    #[test]
    fn test_decode_user_stats_response() {
        let body = serde_json::json!({
            "success": true,
            "data": sample_stats_json()
        });

        let response: UserStatsResponse = serde_json::from_value(body).unwrap();
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data.name, "alpha");
        assert_eq!(data.usage.total.all_tokens, 1000);
        assert_eq!(data.limits.concurrency_limit, 5);
        assert!((data.limits.current_daily_cost - 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_failure_envelope_without_data() {
        let body = serde_json::json!({
            "success": false,
            "message": "apiId not found"
        });

        let response: UserStatsResponse = serde_json::from_value(body).unwrap();
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("apiId not found"));
    }

    #[test]
    fn test_decode_model_stats_response() {
        let body = serde_json::json!({
            "success": true,
            "period": "daily",
            "data": [
                {
                    "model": "claude-sonnet-4",
                    "requests": 10,
                    "inputTokens": 100,
                    "outputTokens": 50,
                    "cacheCreateTokens": 0,
                    "cacheReadTokens": 25,
                    "allTokens": 175
                },
                {
                    "model": "claude-opus-4",
                    "requests": 2,
                    "inputTokens": 30,
                    "outputTokens": 20,
                    "cacheCreateTokens": 0,
                    "cacheReadTokens": 0,
                    "allTokens": 50
                }
            ]
        });

        let response: ModelStatsResponse = serde_json::from_value(body).unwrap();
        assert!(response.success);
        let models = response.data.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models.iter().map(|m| m.all_tokens).sum::<u64>(), 225);
    }

    #[test]
    fn test_decode_model_stats_null_data() {
        let body = serde_json::json!({ "success": true });
        let response: ModelStatsResponse = serde_json::from_value(body).unwrap();
        assert!(response.success);
        assert!(response.data.is_none());
    }

    // ========== expiry parsing tests ==========

    #[test]
    fn test_expires_at_parsed() {
        let data: ApiStatsData = serde_json::from_value(sample_stats_json()).unwrap();
        let parsed = data.expires_at_parsed().unwrap();
        assert_eq!(parsed.timezone().local_minus_utc(), 0);
    }

    #[test]
    fn test_expires_at_parsed_invalid() {
        let mut data: ApiStatsData = serde_json::from_value(sample_stats_json()).unwrap();
        data.expires_at = "never".into();
        assert!(data.expires_at_parsed().is_none());
    }
}
