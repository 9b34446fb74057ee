//! Backoff policy for transient transport failures.

use std::time::Duration;

use rand::Rng;

use crate::error::GraphqlClientError;

/// Retry decision result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after a delay.
    RetryAfter(Duration),
    /// Do not retry.
    DoNotRetry,
}

/// Retry policy configuration.
///
/// Only transport failures are retried: timeouts, connection errors, 5xx and
/// 429 responses. GraphQL errors in a 200 response are final.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: usize,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum jitter to add to delays.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            max_jitter: Duration::from_millis(150),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn never() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Decide whether to retry based on the error and attempt count.
    #[must_use]
    pub fn decide(&self, error: &GraphqlClientError, attempt: usize) -> RetryDecision {
        if attempt >= self.max_attempts || !error.is_retryable() {
            return RetryDecision::DoNotRetry;
        }

        if let GraphqlClientError::HttpStatus {
            retry_after: Some(delay),
            ..
        } = error
        {
            return RetryDecision::RetryAfter((*delay).min(self.max_delay));
        }

        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let exp = 2_u64.saturating_pow(u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX));
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let delay_ms = base_ms.saturating_mul(exp).min(max_ms);
        let jitter_ms = if self.max_jitter.is_zero() {
            0
        } else {
            let jitter_max = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
            rand::thread_rng().gen_range(0..=jitter_max)
        };
        RetryDecision::RetryAfter(Duration::from_millis(delay_ms.saturating_add(jitter_ms)))
    }
}
