//! Bounded retry with exponential backoff for transient remote failures.
//!
//! The embedding contract only requires a single attempt per request; retry is
//! the permitted quality improvement on top. Non-retryable errors (4xx other
//! than 429) fail immediately.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial call.
    pub max_retries: u32,
    /// Base delay between retries (exponentially increased).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Whether to add random jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Heuristic over error text: transient transport and throttling failures are
/// worth retrying, client errors are not.
pub(crate) fn is_retryable_error(error: &str) -> bool {
    let lowered = error.to_ascii_lowercase();
    lowered.contains("timeout")
        || lowered.contains("timed out")
        || lowered.contains("connection")
        || lowered.contains("429")
        || lowered.contains("500")
        || lowered.contains("502")
        || lowered.contains("503")
        || lowered.contains("504")
}

fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exp = config
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt));
    let capped = exp.min(config.max_delay);
    if config.jitter {
        // Up to +25% so synchronized clients don't stampede the endpoint.
        let jitter_ms = (capped.as_millis() as f64 * 0.25 * fastrand::f64()) as u64;
        capped + Duration::from_millis(jitter_ms)
    } else {
        capped
    }
}

/// Execute an async operation with retry logic. The operation receives the
/// current attempt number (0 = first try) and reports failures as strings; the
/// last error is returned when all attempts are exhausted.
pub(crate) async fn execute_with_retry<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, String>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let retryable = is_retryable_error(&error);
                last_error = Some(error);

                if !retryable || attempt == config.max_retries {
                    break;
                }
                tokio::time::sleep(calculate_delay(config, attempt)).await;
            }
        }
    }

    Err(last_error.unwrap_or_else(|| "all retries failed".to_string()))
}
