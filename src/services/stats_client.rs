//! Stats client: one fetch cycle against a single relay endpoint
//!
//! A cycle issues the user-stats and model-stats calls concurrently, each
//! wrapped in its own bounded fixed-interval retry. Both calls must succeed
//! for the cycle to succeed; there is no partial result. Nothing is cached,
//! so every cycle reflects the remote state at call time.

use std::future::Future;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EndpointConfig;
use crate::types::{
    ApiError, ApiStatsData, CombinedStats, ModelStatsResponse, QuotrackError, Result,
    UserStatsResponse,
};

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Max attempts per remote call
const MAX_ATTEMPTS: u32 = 3;

/// Fixed wait between attempts
const RETRY_DELAY: Duration = Duration::from_secs(10);

/// Retry policy for a single remote call: a fixed number of attempts with a
/// fixed wait in between. No backoff, no jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delay: RETRY_DELAY,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsRequest<'a> {
    api_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelStatsRequest<'a> {
    api_id: &'a str,
    period: &'a str,
}

/// HTTP client for the relay usage-stats API
pub struct StatsClient {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl StatsClient {
    pub fn new() -> Result<Self> {
        Self::with_retry(RetryPolicy::default())
    }

    pub fn with_retry(retry: RetryPolicy) -> Result<Self> {
        Self::with_timeout(retry, REQUEST_TIMEOUT)
    }

    /// Custom request timeout (tests use this to force quick timeouts)
    pub fn with_timeout(retry: RetryPolicy, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuotrackError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, retry })
    }

    /// Run one fetch cycle: both calls concurrently, both must succeed.
    pub async fn fetch_combined(
        &self,
        endpoint: &EndpointConfig,
    ) -> std::result::Result<CombinedStats, ApiError> {
        debug!(endpoint = %endpoint.name, "fetch cycle");
        let (stats, daily_tokens) = tokio::join!(
            self.fetch_user_stats(endpoint),
            self.fetch_daily_tokens(endpoint),
        );
        Ok(CombinedStats {
            stats: stats?,
            daily_tokens: daily_tokens?,
        })
    }

    async fn fetch_user_stats(
        &self,
        endpoint: &EndpointConfig,
    ) -> std::result::Result<ApiStatsData, ApiError> {
        let url = parse_url(&endpoint.user_stats_url())?;
        self.retry_call(|| self.post_user_stats(url.clone(), &endpoint.api_id))
            .await
    }

    async fn fetch_daily_tokens(
        &self,
        endpoint: &EndpointConfig,
    ) -> std::result::Result<u64, ApiError> {
        let url = parse_url(&endpoint.model_stats_url())?;
        self.retry_call(|| self.post_daily_tokens(url.clone(), &endpoint.api_id))
            .await
    }

    /// Retry a call under the client's policy.
    ///
    /// Non-retryable errors surface immediately; once all attempts are spent
    /// the last error surfaces wrapped with the attempt count.
    async fn retry_call<T, F, Fut>(&self, op: F) -> std::result::Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, ApiError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt >= self.retry.max_attempts => {
                    return Err(ApiError::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    warn!(attempt, error = %err, "stats call failed, retrying");
                    tokio::time::sleep(self.retry.delay).await;
                }
            }
        }
    }

    async fn post_user_stats(
        &self,
        url: Url,
        api_id: &str,
    ) -> std::result::Result<ApiStatsData, ApiError> {
        let response = self
            .http
            .post(url)
            .json(&StatsRequest { api_id })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.ok().filter(|b| !b.is_empty());
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let result: UserStatsResponse = response.json().await.map_err(response_error)?;
        match (result.success, result.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(envelope_failure(result.message)),
        }
    }

    async fn post_daily_tokens(
        &self,
        url: Url,
        api_id: &str,
    ) -> std::result::Result<u64, ApiError> {
        let response = self
            .http
            .post(url)
            .json(&ModelStatsRequest {
                api_id,
                period: "daily",
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.ok().filter(|b| !b.is_empty());
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let result: ModelStatsResponse = response.json().await.map_err(response_error)?;
        if !result.success {
            return Err(envelope_failure(result.message));
        }

        // A missing break-down means zero usage for the day, not an error
        Ok(result
            .data
            .map(|models| models.iter().map(|m| m.all_tokens).sum())
            .unwrap_or(0))
    }
}

fn parse_url(raw: &str) -> std::result::Result<Url, ApiError> {
    Url::parse(raw).map_err(|_| ApiError::InvalidUrl(raw.to_string()))
}

fn envelope_failure(message: Option<String>) -> ApiError {
    match message {
        Some(message) => ApiError::Business(message),
        None => ApiError::InvalidResponse,
    }
}

/// Classify an error from sending the request
fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Network {
        code: os_error_code(&err),
        detail: err.to_string(),
    }
}

/// Classify an error from reading or decoding a 200 body
fn response_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network {
            code: os_error_code(&err),
            detail: err.to_string(),
        }
    }
}

/// Walk the source chain for an OS-level error code
fn os_error_code(err: &(dyn std::error::Error + 'static)) -> Option<i32> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if let Some(code) = io.raw_os_error() {
                return Some(code);
            }
        }
        source = inner.source();
    }
    None
}
