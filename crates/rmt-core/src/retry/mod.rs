//! Retry and backoff policy.
//!
//! This module encapsulates error classification (timeouts, throttling,
//! connection failures) and exponential backoff decisions so the upload and
//! download drivers share a consistent policy.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryFailure};
