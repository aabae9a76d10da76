//! Retry policy and classification of HTTP failures.

use reqwest::{Response, StatusCode, header::HeaderMap};
use std::time::Duration;
use thiserror::Error;

/// Maximum number of attempts for a network operation.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// How many times an operation is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: MAX_RETRIES,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Attempt once, never retry.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Failures that will not go away by asking again.
#[derive(Debug, Error)]
pub enum NonRetryableError {
    #[error("Rate limit exceeded: {0}. Try again later or set the GITHUB_TOKEN environment variable.")]
    RateLimitExceeded(String),
    #[error("Authentication failed: {0}. Check your GITHUB_TOKEN.")]
    AuthenticationFailed(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Access forbidden: {0}. You may need authentication.")]
    Forbidden(String),
    #[error("Request error: {0}")]
    ClientError(String),
}

/// Classify a failed status. `Ok(())` means the failure is worth retrying.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // Connection errors, timeouts, truncated bodies
        return Ok(());
    };

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(
            "invalid or missing authentication token".to_string(),
        )),
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(
            "access to this resource is forbidden".to_string(),
        )),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(
            "too many requests".to_string(),
        )),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(
            error
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "the requested resource".to_string()),
        )),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} error",
            s.as_u16()
        ))),
        // 5xx
        _ => Ok(()),
    }
}

/// Map an error from `error_for_status()` to the error the retry loop sees.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

/// Pass a successful response through, or classify its error status.
///
/// GitHub reports an exhausted rate limit as 403 with
/// `x-ratelimit-remaining: 0`.
pub fn check_status(response: Response) -> anyhow::Result<Response> {
    if response.status() == StatusCode::FORBIDDEN && is_rate_limited(response.headers()) {
        return Err(NonRetryableError::RateLimitExceeded(
            "GitHub API rate limit exceeded".to_string(),
        )
        .into());
    }
    response.error_for_status().map_err(check_retryable)
}

fn is_rate_limited(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

/// Whether the retry loop should try again after `e`.
pub fn is_retryable(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none()
}
