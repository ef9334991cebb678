//! Retry loop with exponential backoff.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Statuses worth retrying: throttling and transient server failures.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Whether an HTTP status code is worth retrying.
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// How a failed attempt should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    /// Worth another attempt after backoff.
    Transient,
    /// Retrying cannot help; fail immediately.
    Fatal,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub backoff_base: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    /// The delay before retry number `attempt` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2_u32.saturating_pow(attempt))
    }
}

/// Runs an async operation, retrying transient failures with backoff.
///
/// `classify` decides, per error, whether another attempt can help.
/// Fatal errors and the last error after `max_retries` transient ones
/// are returned to the caller unchanged.
///
/// # Errors
///
/// Returns the operation's error once retries are exhausted or the
/// failure is classified [`RetryKind::Fatal`].
pub async fn with_retry<T, E, F, Fut, C>(
    config: &RetryConfig,
    classify: C,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    C: Fn(&E) -> RetryKind,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if classify(&e) == RetryKind::Fatal => return Err(e),
            Err(e) if attempt >= config.max_retries => return Err(e),
            Err(e) => {
                let delay = config.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    error = %e,
                    ?delay,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Classifies one HTTP-layer error.
fn http_retry_kind(error: &Error) -> RetryKind {
    match error {
        // Statuses only become errors when they are in the retryable set.
        Error::Status { .. } => RetryKind::Transient,
        Error::Request(e) if e.is_connect() || e.is_timeout() => RetryKind::Transient,
        Error::Request(_) => RetryKind::Fatal,
    }
}

/// Sends one HTTP request with retries.
///
/// Retries on connect and timeout errors and on 429/500/502/503/504.
/// Any other response, success or not, is returned to the caller
/// immediately for inspection.
///
/// # Errors
///
/// Returns the last transport error or retryable status once retries are
/// exhausted.
pub async fn request_with_retry(
    client: &reqwest::Client,
    method: reqwest::Method,
    url: &str,
    config: &RetryConfig,
) -> Result<reqwest::Response> {
    with_retry(config, http_retry_kind, || async {
        let response = client.request(method.clone(), url).send().await?;
        let status = response.status().as_u16();
        if is_retryable_status(status) {
            return Err(Error::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response)
    })
    .await
}
