//! Progress reporting for transfers (bytes done, ETA, rate).
//!
//! The driver builds a snapshot after every recorded part and hands it to the
//! transaction's progress callback; consumers can compute rate and ETA from it.

use std::sync::Arc;

/// Per-part progress hook carried in `TransferOptions`.
pub type ProgressCallback = Arc<dyn Fn(&ProgressStats) + Send + Sync>;

/// Snapshot of transfer progress for one transaction (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Bytes in recorded parts, including parts recorded by earlier runs.
    pub bytes_done: u64,
    /// Bytes that were already recorded when this run started.
    pub bytes_resumed: u64,
    /// Total object size in bytes.
    pub total_bytes: u64,
    /// Elapsed time since this run started (seconds).
    pub elapsed_secs: f64,
    /// Number of parts recorded.
    pub parts_done: usize,
    /// Total number of parts.
    pub part_count: usize,
}

impl ProgressStats {
    /// Transfer rate of this run in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done.saturating_sub(self.bytes_resumed) as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0 or unknown).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return if self.parts_done >= self.part_count { 1.0 } else { 0.0 };
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(bytes_done: u64, bytes_resumed: u64, elapsed_secs: f64) -> ProgressStats {
        ProgressStats {
            bytes_done,
            bytes_resumed,
            total_bytes: 1000,
            elapsed_secs,
            parts_done: 0,
            part_count: 10,
        }
    }

    #[test]
    fn rate_excludes_resumed_bytes() {
        let s = stats(600, 400, 2.0);
        assert!((s.bytes_per_sec() - 100.0).abs() < 1e-9);
        assert!((s.eta_secs().unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn eta_unknown_without_progress() {
        let s = stats(400, 400, 0.0);
        assert_eq!(s.eta_secs(), None);
        assert!((s.fraction() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn finished_transfer_has_zero_eta() {
        let s = stats(1000, 0, 5.0);
        assert_eq!(s.eta_secs(), Some(0.0));
        assert_eq!(s.fraction(), 1.0);
    }
}
