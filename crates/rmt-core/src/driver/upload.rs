//! Upload driver: read ranges of the source file and upload them as parts.

use super::{pool, Driver, Recorder, TransferSummary};
use crate::error::{Result, TransferError};
use crate::multipart::{Part, Transaction};
use crate::partition::PartRange;
use crate::retry::run_with_retry;
use crate::storage::SourceReader;

impl Driver {
    /// Upload the transaction's pending parts, then compose the object.
    pub fn upload(&self, txn: &Transaction) -> Result<TransferSummary> {
        let source = txn.file();
        let reader = SourceReader::open(source)
            .map_err(|e| TransferError::io(format!("open source {}", source.display()), e))?;
        if reader.len() != txn.source().size() {
            return Err(TransferError::SourceChanged {
                transaction_id: txn.id().to_string(),
                detail: format!(
                    "source {} is {} bytes, transaction planned {}",
                    source.display(),
                    reader.len(),
                    txn.source().size()
                ),
            });
        }

        let (bucket, object, id) = (txn.bucket(), txn.object(), txn.id());
        let pending = txn.pending_ranges();
        let mut recorder = Recorder::new(txn);
        tracing::info!(id, parts = recorder.part_count, pending = pending.len(), "uploading");

        let work = |range: &PartRange| -> Result<Part> {
            let body = reader
                .read_range(range)
                .map_err(|e| TransferError::io(format!("read part {} of {}", range.number, source.display()), e))?;
            run_with_retry(&self.policy, Some(&self.abort), || {
                self.transport
                    .upload_part(bucket, object, id, range.number, range, &body)
            })
            .map_err(|f| f.into_transfer_error(id, Some(range.number)))
        };
        let outcome = pool::run_parts(id, pending, self.max_concurrent, &self.abort, work, |part| {
            recorder.record(part)
        });
        self.abort_if_requested(txn)?;
        outcome?;

        txn.finalize_with(|parts| {
            run_with_retry(&self.policy, Some(&self.abort), || {
                self.transport.complete(bucket, object, id, parts)
            })
            .map_err(|f| f.into_transfer_error(id, None))
        })?;
        Ok(recorder.summary)
    }
}
