//! Timeout and bounded retry around live routing calls.
//!
//! Every attempt runs under the per-call timeout. Only transient failures
//! (transport errors, timeouts, 5xx/429) are retried, with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::oracle::error::OracleError;

/// Hard ceiling on retries, whatever the configuration asks for.
pub const MAX_RETRIES_CEILING: u32 = 3;

const DEFAULT_BASE_DELAY_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 2,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries: max_retries.min(MAX_RETRIES_CEILING),
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// 200ms -> 400ms -> 800ms with the default base delay.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

pub(crate) async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut call: F) -> Result<T, OracleError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OracleError>>,
{
    let max_retries = policy.max_retries.min(MAX_RETRIES_CEILING);
    let mut attempt = 0;

    loop {
        let outcome = match tokio::time::timeout(policy.timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(policy.timeout)),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_retries => {
                let delay = policy.backoff(attempt);
                attempt += 1;
                warn!(
                    attempt,
                    max_retries,
                    error = %err,
                    "live distance lookup failed, retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
