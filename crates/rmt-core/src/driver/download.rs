//! Download driver: fetch parts into a preallocated temp file, then rename it
//! over the destination.

use std::io;

use super::{pool, Driver, Recorder, TransferSummary};
use crate::error::{Result, TransferError};
use crate::multipart::{Part, Transaction};
use crate::partition::PartRange;
use crate::retry::run_with_retry;
use crate::storage::{self, StorageWriter, StorageWriterBuilder};
use crate::transport::TransportError;

impl Driver {
    /// Download the transaction's pending parts, then move the temp file into place.
    pub fn download(&self, txn: &Transaction) -> Result<TransferSummary> {
        let writer = open_sink(txn)?;
        let (bucket, object, id) = (txn.bucket(), txn.object(), txn.id());
        let pending = txn.pending_ranges();
        let mut recorder = Recorder::new(txn);
        tracing::info!(id, parts = recorder.part_count, pending = pending.len(), "downloading");

        let work = |range: &PartRange| -> Result<Part> {
            let (bytes, part) = run_with_retry(&self.policy, Some(&self.abort), || {
                let (bytes, part) = self
                    .transport
                    .download_part(bucket, object, id, range.number, range)?;
                if bytes.len() as u64 != range.len() {
                    return Err(TransportError::PartialTransfer {
                        expected: range.len(),
                        received: bytes.len() as u64,
                    });
                }
                Ok((bytes, part))
            })
            .map_err(|f| f.into_transfer_error(id, Some(range.number)))?;
            writer
                .write_at(range.start, &bytes)
                .map_err(|e| TransferError::io(format!("write part {} to {}", range.number, writer.temp_path().display()), e))?;
            Ok(part)
        };
        // Part bytes must be on disk before the checkpoint claims them.
        let outcome = pool::run_parts(id, pending, self.max_concurrent, &self.abort, work, |part| {
            writer
                .sync()
                .map_err(|e| TransferError::io(format!("sync {}", writer.temp_path().display()), e))?;
            recorder.record(part)
        });
        self.abort_if_requested(txn)?;
        outcome?;

        let dest = txn.file().to_path_buf();
        txn.finalize_with(move |_| {
            writer
                .finalize(&dest)
                .map_err(|e| TransferError::io(format!("move download into {}", dest.display()), e))
        })?;
        Ok(recorder.summary)
    }
}

/// Create the temp file on a fresh run, reopen it when resuming.
fn open_sink(txn: &Transaction) -> Result<StorageWriter> {
    let temp = storage::temp_path(txn.file());
    let size = txn.source().size();
    if txn.completed_parts().is_empty() {
        let mut builder = StorageWriterBuilder::create(&temp)
            .map_err(|e| TransferError::io(format!("create {}", temp.display()), e))?;
        builder
            .preallocate(size)
            .map_err(|e| TransferError::io(format!("preallocate {}", temp.display()), e))?;
        return Ok(builder.build());
    }
    match StorageWriter::open_existing(&temp, size) {
        Ok(w) => Ok(w),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::InvalidData) => {
            Err(TransferError::SourceChanged {
                transaction_id: txn.id().to_string(),
                detail: format!(
                    "recorded parts live in {} which is missing or resized ({}); remove the checkpoint to start over",
                    temp.display(),
                    e
                ),
            })
        }
        Err(e) => Err(TransferError::io(format!("open {}", temp.display()), e)),
    }
}
