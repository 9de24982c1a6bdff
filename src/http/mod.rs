//! HTTP client module with timeout, retry logic and error handling.

mod client;
mod retry;

pub use client::{HttpClient, HttpOptions, build_http_client};
pub use retry::{NonRetryableError, RetryPolicy, check_retryable, classify_error};
