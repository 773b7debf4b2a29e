use std::time::Duration;

use crate::config::RetryConfig;

/// High-level classification of a transport failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Service asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, short body).
    Connection,
    /// Retryable server-side status that is not strictly throttling (5xx).
    Server(u16),
    /// Authorization, missing bucket/object, quota, local IO: never retried.
    Fatal,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::Fatal)
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build from the `[retry]` config section.
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(cfg.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }

    /// Compute the next backoff delay for a given attempt and error kind.
    ///
    /// `attempt` is 1-based (1 = first attempt). Returns `RetryDecision::NoRetry`
    /// when we should stop retrying.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts || !kind.is_retryable() {
            return RetryDecision::NoRetry;
        }
        // base * 2^(attempt-1), capped; throttling backs off one step further.
        let step = match kind {
            ErrorKind::Throttled => attempt,
            _ => attempt.saturating_sub(1),
        };
        let exp = 1u32 << step.min(8);
        let delay = self.base_delay.saturating_mul(exp).min(self.max_delay);
        RetryDecision::RetryAfter(delay)
    }
}
