//! Retry loop: run a transport call until success or the policy says stop.

use super::classify;
use super::policy::{ErrorKind, RetryDecision, RetryPolicy};
use crate::control::AbortHandle;
use crate::error::TransferError;
use crate::transport::TransportError;

/// Last error of a call the policy gave up on.
#[derive(Debug)]
pub struct RetryFailure {
    pub error: TransportError,
    pub kind: ErrorKind,
    pub attempts: u32,
}

impl RetryFailure {
    /// Failure of a call made exactly once.
    pub fn single(error: TransportError) -> Self {
        let kind = classify::classify(&error);
        RetryFailure {
            error,
            kind,
            attempts: 1,
        }
    }

    /// Attach transaction context. Retryable kinds become `TransientTransfer`
    /// (budget exhausted), the rest `FatalTransfer`.
    pub fn into_transfer_error(self, transaction_id: &str, part_number: Option<u32>) -> TransferError {
        if self.kind.is_retryable() {
            TransferError::TransientTransfer {
                transaction_id: transaction_id.to_string(),
                part_number,
                attempts: self.attempts,
                source: self.error,
            }
        } else {
            TransferError::FatalTransfer {
                transaction_id: transaction_id.to_string(),
                part_number,
                source: self.error,
            }
        }
    }
}

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
/// A pending abort request stops further attempts.
pub fn run_with_retry<T, F>(
    policy: &RetryPolicy,
    abort: Option<&AbortHandle>,
    mut f: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> Result<T, TransportError>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(error) => {
                let kind = classify::classify(&error);
                let aborting = abort.is_some_and(|a| a.is_abort_requested());
                match policy.decide(attempt, kind) {
                    RetryDecision::RetryAfter(d) if !aborting => {
                        tracing::warn!(attempt, ?kind, delay_ms = d.as_millis() as u64, "retrying after: {}", error);
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                    _ => {
                        return Err(RetryFailure {
                            error,
                            kind,
                            attempts: attempt,
                        })
                    }
                }
            }
        }
    }
}
