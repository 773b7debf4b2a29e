//! Transfer driver: moves a transaction's pending parts through the transport.
//!
//! The driver plans the object into part ranges, dispatches only those without a
//! recorded part to a bounded pool of worker threads, records each completed part
//! on the coordinating thread, and finalizes once every range has a part.
//! Transport calls are retried per `RetryPolicy`; anything that survives the
//! budget stops the run with the checkpoint intact.

mod download;
mod invoke;
mod pool;
mod upload;

use std::sync::Arc;
use std::time::Instant;

use crate::control::AbortHandle;
use crate::error::{Result, TransferError};
use crate::logging;
use crate::multipart::{Part, Transaction, TransferKind};
use crate::progress::ProgressStats;
use crate::retry::RetryPolicy;
use crate::transport::Transport;

pub use invoke::run_blocking;

/// Default number of parts in flight at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Counts for one driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSummary {
    /// Parts in the plan.
    pub parts_total: usize,
    /// Parts already recorded when the run started.
    pub parts_skipped: usize,
    /// Parts transferred and recorded by this run.
    pub parts_transferred: usize,
    /// Bytes transferred by this run.
    pub bytes_transferred: u64,
}

/// Runs transactions against one transport.
#[derive(Clone)]
pub struct Driver {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    max_concurrent: usize,
    abort: AbortHandle,
}

impl Driver {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Driver {
            transport,
            policy: RetryPolicy::default(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            abort: AbortHandle::new(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of worker threads; values below 1 are treated as 1.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Token that stops this driver's runs when set.
    pub fn abort_handle(&self) -> &AbortHandle {
        &self.abort
    }

    /// Drive `txn` to completion: transfer pending parts, then finalize.
    pub fn run(&self, txn: &Transaction) -> Result<TransferSummary> {
        let _entered = logging::transfer_span(txn).entered();
        match txn.kind() {
            TransferKind::Upload => self.upload(txn),
            TransferKind::Download => self.download(txn),
        }
    }

    /// After the pool stops: if abort was requested, abort the transaction and
    /// report `Aborted` (or the cleanup failure).
    fn abort_if_requested(&self, txn: &Transaction) -> Result<()> {
        if !self.abort.is_abort_requested() {
            return Ok(());
        }
        txn.abort(self.transport())?;
        Err(TransferError::Aborted {
            transaction_id: txn.id().to_string(),
        })
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("policy", &self.policy)
            .field("max_concurrent", &self.max_concurrent)
            .field("abort_requested", &self.abort.is_abort_requested())
            .finish_non_exhaustive()
    }
}

/// Records parts on the coordinating thread and reports progress after each one.
struct Recorder<'a> {
    txn: &'a Transaction,
    started: Instant,
    bytes_resumed: u64,
    total_bytes: u64,
    part_count: usize,
    summary: TransferSummary,
}

impl<'a> Recorder<'a> {
    fn new(txn: &'a Transaction) -> Self {
        let part_count = txn.plan().len();
        let parts_skipped = txn.completed_parts().len();
        Recorder {
            txn,
            started: Instant::now(),
            bytes_resumed: txn.completed_bytes(),
            total_bytes: txn.source().size(),
            part_count,
            summary: TransferSummary {
                parts_total: part_count,
                parts_skipped,
                ..TransferSummary::default()
            },
        }
    }

    fn record(&mut self, part: Part) -> Result<()> {
        let size = part.size();
        self.txn.record_part(part)?;
        self.summary.parts_transferred += 1;
        self.summary.bytes_transferred += size;
        self.txn.options().report(&ProgressStats {
            bytes_done: self.txn.completed_bytes(),
            bytes_resumed: self.bytes_resumed,
            total_bytes: self.total_bytes,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            parts_done: self.summary.parts_skipped + self.summary.parts_transferred,
            part_count: self.part_count,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests;
