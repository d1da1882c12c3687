// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resilient request layer.
//!
//! ```text
//! send_with_retry(request)
//!   attempt 0..max_attempts
//!     execute --> ApiResponse
//!       rate limited (403 "rate limit"/"abuse"/remaining=0, or 429)
//!         delay = Retry-After | X-RateLimit-Reset - now | 2^n * 60s
//!                 + jitter [0, 5s), capped at 300s
//!       5xx
//!         delay = 2^n * 1s + jitter [0, 1s), capped at 300s
//!       otherwise --> return
//!     last attempt --> return the response as-is, no sleep
//! ```
//!
//! A non-2xx status is never an error here; callers classify the returned
//! response. Transport failures are not retried.

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Request, StatusCode};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, trace, warn};

use crate::api::response::ApiResponse;
use crate::config::types::RetryConfig;
use crate::error::{ForgeError, ForgeResult, NetworkError};

/// Backoff parameters for [`send_with_retry`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub max_delay: Duration,
    pub rate_limit_backoff: Duration,
    pub rate_limit_jitter: Duration,
    pub server_error_backoff: Duration,
    pub server_error_jitter: Duration,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        let max_delay = Duration::from_secs(config.max_delay_secs);
        // Jitter past the ceiling is never observable.
        let jitter = |secs: f64| match Duration::try_from_secs_f64(secs) {
            Ok(jitter) => jitter.min(max_delay),
            Err(_) if secs > 0.0 => max_delay,
            Err(_) => Duration::ZERO,
        };
        Self {
            max_attempts: config.max_attempts,
            max_delay,
            rate_limit_backoff: Duration::from_secs(config.rate_limit_backoff_secs),
            rate_limit_jitter: jitter(config.rate_limit_jitter_secs),
            server_error_backoff: Duration::from_secs(config.server_error_backoff_secs),
            server_error_jitter: jitter(config.server_error_jitter_secs),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Retry without ever sleeping.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            max_delay: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
            rate_limit_jitter: Duration::ZERO,
            server_error_backoff: Duration::ZERO,
            server_error_jitter: Duration::ZERO,
        }
    }
}

/// Why a response is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    RateLimited,
    ServerError,
}

impl RetryReason {
    #[must_use]
    pub fn of(response: &ApiResponse) -> Option<Self> {
        if response.is_rate_limited() {
            Some(Self::RateLimited)
        } else if response.status.is_server_error() {
            Some(Self::ServerError)
        } else {
            None
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate limited",
            Self::ServerError => "server error",
        }
    }
}

pub(crate) fn header_u64(headers: &HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Whether the server refused the call for quota reasons.
#[must_use]
pub fn is_rate_limited(status: StatusCode, headers: &HeaderMap, body: &str) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => {
            let body = body.to_lowercase();
            body.contains("rate limit")
                || body.contains("abuse")
                || header_u64(headers, "x-ratelimit-remaining") == Some(0)
        }
        _ => false,
    }
}

fn exponential(unit: Duration, attempt: u32) -> Duration {
    unit.saturating_mul(2_u32.saturating_pow(attempt))
}

/// Delay before retrying a rate-limited response.
///
/// `attempt` is zero-based; `now` is the current unix time in seconds.
#[must_use]
pub fn rate_limit_delay(
    policy: &RetryPolicy,
    attempt: u32,
    headers: &HeaderMap,
    now: u64,
    jitter: Duration,
) -> Duration {
    let base = if let Some(secs) = header_u64(headers, RETRY_AFTER) {
        Duration::from_secs(secs)
    } else if let Some(reset) = header_u64(headers, "x-ratelimit-reset") {
        Duration::from_secs(reset.saturating_sub(now))
    } else {
        exponential(policy.rate_limit_backoff, attempt)
    };
    base.saturating_add(jitter).min(policy.max_delay)
}

/// Delay before retrying a 5xx response.
#[must_use]
pub fn server_error_delay(policy: &RetryPolicy, attempt: u32, jitter: Duration) -> Duration {
    exponential(policy.server_error_backoff, attempt)
        .saturating_add(jitter)
        .min(policy.max_delay)
}

fn random_jitter(upper: Duration) -> Duration {
    if upper.is_zero() {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(rand::rng().random_range(0.0..upper.as_secs_f64()))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

impl RetryPolicy {
    fn delay(&self, reason: RetryReason, attempt: u32, response: &ApiResponse) -> Duration {
        match reason {
            RetryReason::RateLimited => rate_limit_delay(
                self,
                attempt,
                &response.headers,
                unix_now(),
                random_jitter(self.rate_limit_jitter),
            ),
            RetryReason::ServerError => {
                server_error_delay(self, attempt, random_jitter(self.server_error_jitter))
            }
        }
    }
}

async fn execute_once(client: &Client, request: Request) -> ForgeResult<ApiResponse> {
    let url = request.url().to_string();
    let transport = |e: reqwest::Error| -> ForgeError {
        if e.is_timeout() {
            NetworkError::Timeout { url: url.clone() }.into()
        } else {
            NetworkError::Reqwest(e).into()
        }
    };
    let response = client.execute(request).await.map_err(&transport)?;
    ApiResponse::read(response).await.map_err(&transport)
}

/// Send `request`, retrying rate-limit and 5xx responses per `policy`.
///
/// # Errors
///
/// Returns `NetworkError` for transport failures, and
/// `ForgeError::Other` if the request body cannot be replayed.
pub async fn send_with_retry(
    client: &Client,
    request: Request,
    policy: &RetryPolicy,
) -> ForgeResult<ApiResponse> {
    let method = request.method().clone();
    let url = request.url().to_string();
    let max_attempts = policy.max_attempts.max(1);

    let mut attempt = 0;
    loop {
        let this = request
            .try_clone()
            .ok_or_else(|| ForgeError::Other(format!("cannot replay request to {url}").into()))?;
        let response = execute_once(client, this).await?;
        debug!(%method, url, status = response.status.as_u16(), attempt, "request finished");
        trace!(url, body = response.body.as_str(), "response body");

        let Some(reason) = RetryReason::of(&response) else {
            return Ok(response);
        };
        if attempt + 1 >= max_attempts {
            return Ok(response);
        }

        let delay = policy.delay(reason, attempt, &response);
        warn!(
            %method,
            url,
            status = response.status.as_u16(),
            reason = reason.as_str(),
            attempt = attempt + 1,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "retrying request"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
