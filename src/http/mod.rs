//! HTTP client with retry logic and error classification.

mod client;
mod retry;

pub use client::HttpClient;
pub use retry::{
    MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, RetryPolicy, check_retryable, check_status,
    classify_error, is_retryable,
};
