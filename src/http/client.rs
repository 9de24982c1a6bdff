//! HTTP client with explicit timeouts and built-in retry logic.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use super::retry::{NonRetryableError, RetryPolicy, check_retryable};

/// Default user agent sent with every request.
pub const USER_AGENT: &str = "ghupd";

/// Settings used to build the underlying reqwest client.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Upper bound for a whole request, body included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

/// Build an HTTP client from options.
pub fn build_http_client(options: &HttpOptions) -> Result<HttpClient> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(options.timeout)
        .connect_timeout(options.connect_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    Ok(HttpClient::new(client).with_retry_policy(options.retry))
}

/// HTTP client with built-in retry logic for network operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and returns the response body as text.
    ///
    /// `bearer` is sent as an `Authorization: Bearer` header when present.
    /// Transient errors are retried according to the retry policy; client
    /// errors (4xx) fail immediately.
    #[tracing::instrument(skip(self, query, bearer))]
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<String> {
        debug!("GET {} ({} query parameter(s))...", url, query.len());

        let auth = match bearer {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Access token is not a valid header value")?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        self.with_retry("GET", || async {
            let mut request = self.client.get(url).query(query);
            if let Some(value) = &auth {
                request = request.header(AUTHORIZATION, value.clone());
            }

            let response = request.send().await.context("Failed to send request")?;
            let response = response.error_for_status().map_err(check_retryable)?;

            response
                .text()
                .await
                .context("Failed to read response body")
        })
        .await
    }

    /// Executes an async operation with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_attempts = self.retry.attempts();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable_error(&e) {
                        debug!("{}: non-retryable error: {}", operation_name, e);
                        return Err(e);
                    }

                    if attempt < max_attempts {
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                            operation_name,
                            attempt,
                            max_attempts,
                            e,
                            self.retry.delay.as_millis()
                        );
                        tokio::time::sleep(self.retry.delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("{}: failed after {} attempts", operation_name, max_attempts)
        }))
    }
}

/// Checks if an anyhow::Error is retryable based on its content.
fn is_retryable_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none()
}
