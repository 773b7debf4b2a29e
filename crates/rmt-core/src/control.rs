//! Transfer control for cancellation: a shared abort token.
//!
//! The driver checks the token before dispatching each part and between retry
//! attempts. Once set, in-flight parts finish, nothing new is dispatched, and the
//! driver runs `Transaction::abort`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable abort token shared between a caller and a running driver.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Safe to call from any thread, any number of times.
    pub fn request_abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_abort_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let a = AbortHandle::new();
        let b = a.clone();
        assert!(!b.is_abort_requested());
        a.request_abort();
        assert!(b.is_abort_requested());
    }
}
