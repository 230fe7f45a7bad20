//! Retry with exponential backoff for stage attempts.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::StageError;
use crate::metrics::record_stage_retry;

/// Configuration for stage retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before the given retry attempt (1-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        delay.min(self.max_delay)
    }
}

/// Run a stage attempt, retrying retryable failures with backoff.
///
/// Permanent failures return immediately; retryable ones sleep for the
/// backoff delay (or the provider's retry-after hint, whichever is
/// longer) before the next attempt, up to `max_retries` extra attempts.
pub async fn retry_stage<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T, StageError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StageError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.retryable && attempt < config.max_retries => {
                attempt += 1;
                let mut delay = config.delay_for_attempt(attempt);
                if let Some(hint_ms) = e.retry_after_ms {
                    delay = delay.max(Duration::from_millis(hint_ms));
                }

                record_stage_retry(e.stage);
                warn!(
                    stage = %e.stage,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Stage attempt failed, retrying: {}",
                    e.message
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
