//! The transaction state machine.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::options::{TransferKind, TransferOptions, TransferRequest};
use super::part::Part;
use crate::checkpoint::{remove_checkpoint, CheckpointState};
use crate::driver::{Driver, TransferSummary};
use crate::error::{Result, TransferError};
use crate::partition::{pending_ranges, plan_parts, PartRange};
use crate::retry::RetryFailure;
use crate::safe_resume::{self, SourceMeta};
use crate::storage;
use crate::transport::Transport;

/// Lifecycle of a transaction. `Active` is the only state with outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    Active,
    Finalized,
    Aborted,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Active => write!(f, "active"),
            TransactionState::Finalized => write!(f, "finalized"),
            TransactionState::Aborted => write!(f, "aborted"),
        }
    }
}

struct Progress {
    parts: BTreeMap<u32, Part>,
    state: TransactionState,
    version: u64,
}

/// One multipart transfer. Identity fields never change after construction; the
/// part set, version and state live behind a mutex so concurrent workers can
/// record parts while each checkpoint write stays whole.
pub struct Transaction {
    id: String,
    kind: TransferKind,
    bucket: String,
    object: String,
    file: PathBuf,
    creation_time: DateTime<Utc>,
    options: TransferOptions,
    source: SourceMeta,
    progress: Mutex<Progress>,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("bucket", &self.bucket)
            .field("object", &self.object)
            .field("file", &self.file)
            .field("creation_time", &self.creation_time)
            .finish_non_exhaustive()
    }
}

impl Transaction {
    /// Start a fresh transaction and write its first checkpoint.
    ///
    /// Uploads register with the service to obtain their id; downloads get a
    /// locally generated one. The source is snapshotted so a later resume can
    /// tell whether the data changed.
    pub fn start(transport: &dyn Transport, request: TransferRequest) -> Result<Transaction> {
        request.validate()?;
        let target = format!("{}/{}", request.bucket, request.object);
        let source = current_source(transport, &request, &target)?;
        let id = match request.kind {
            TransferKind::Upload => transport
                .initiate(&request.bucket, &request.object, &request.options)
                .map_err(|e| RetryFailure::single(e).into_transfer_error(&target, None))?,
            TransferKind::Download => uuid::Uuid::new_v4().to_string(),
        };

        let txn = Transaction {
            id,
            kind: request.kind,
            bucket: request.bucket,
            object: request.object,
            file: request.file,
            creation_time: Utc::now(),
            options: request.options,
            source,
            progress: Mutex::new(Progress {
                parts: BTreeMap::new(),
                state: TransactionState::Active,
                version: 0,
            }),
        };
        if let Err(e) = txn.persist(&txn.lock()) {
            if txn.kind == TransferKind::Upload {
                if let Err(cancel) = transport.cancel(&txn.bucket, &txn.object, &txn.id) {
                    tracing::warn!(id = %txn.id, "could not release upload after checkpoint failure: {}", cancel);
                }
            }
            return Err(e);
        }
        tracing::info!(
            id = %txn.id,
            kind = %txn.kind,
            bucket = %txn.bucket,
            object = %txn.object,
            cpt = %txn.options.cpt_file.display(),
            "started transaction"
        );
        Ok(txn)
    }

    /// Load the checkpoint at `path` and trust the request it records.
    ///
    /// Used to inspect or abort a transfer when the original request is not at
    /// hand. No progress callback is attached. Later writes and the final removal
    /// go to `path`, wherever the checkpoint was originally written.
    pub fn open(path: &Path) -> Result<Transaction> {
        let mut state = CheckpointState::load(path)?;
        state.options.cpt_file = path.to_path_buf();
        Ok(Self::from_checkpoint(state, None))
    }

    /// Resume the transaction whose checkpoint is at `request.options.cpt_file`.
    ///
    /// Fails with `CheckpointBroken` if the file does not verify,
    /// `CheckpointInvalid` if it was written for a different request, and
    /// `SourceChanged` if the data behind the transfer changed since.
    pub fn resume(transport: &dyn Transport, request: TransferRequest) -> Result<Transaction> {
        request.validate()?;
        let path = request.options.cpt_file.clone();
        let state = CheckpointState::load(&path)?;
        safe_resume::validate_request(&state, &request).map_err(|m| TransferError::CheckpointInvalid {
            path: path.clone(),
            mismatch: m.to_string(),
        })?;
        let current = current_source(transport, &request, &state.id)?;
        safe_resume::validate_source(&state.source, &current).map_err(|m| TransferError::SourceChanged {
            transaction_id: state.id.clone(),
            detail: m.to_string(),
        })?;

        let txn = Self::from_checkpoint(state, request.options.progress_callback);
        tracing::info!(
            id = %txn.id,
            kind = %txn.kind,
            parts = txn.lock().parts.len(),
            cpt = %path.display(),
            "resumed transaction"
        );
        Ok(txn)
    }

    /// Resume if the request's checkpoint exists, start fresh otherwise.
    pub fn start_or_resume(transport: &dyn Transport, request: TransferRequest) -> Result<Transaction> {
        if request.options.cpt_file.exists() {
            Self::resume(transport, request)
        } else {
            Self::start(transport, request)
        }
    }

    fn from_checkpoint(state: CheckpointState, progress_callback: Option<crate::progress::ProgressCallback>) -> Self {
        let mut options = state.options;
        options.progress_callback = progress_callback;
        Transaction {
            id: state.id,
            kind: state.kind,
            bucket: state.bucket,
            object: state.object,
            file: state.file,
            creation_time: state.creation_time,
            options,
            source: state.source,
            progress: Mutex::new(Progress {
                parts: state.parts.into_iter().map(|p| (p.number(), p)).collect(),
                state: TransactionState::Active,
                version: state.version,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_active(&self, progress: &Progress) -> Result<()> {
        match progress.state {
            TransactionState::Active => Ok(()),
            state => Err(TransferError::InvalidState {
                transaction_id: self.id.clone(),
                state,
            }),
        }
    }

    fn snapshot(&self, progress: &Progress) -> CheckpointState {
        CheckpointState {
            id: self.id.clone(),
            kind: self.kind,
            bucket: self.bucket.clone(),
            object: self.object.clone(),
            file: self.file.clone(),
            options: self.options.clone(),
            creation_time: self.creation_time,
            version: progress.version,
            source: self.source.clone(),
            parts: progress.parts.values().cloned().collect(),
        }
    }

    fn persist(&self, progress: &Progress) -> Result<()> {
        self.snapshot(progress).save(&self.options.cpt_file)?;
        Ok(())
    }

    /// Record a completed part and rewrite the checkpoint before returning.
    ///
    /// A part with an already recorded number replaces the earlier one; a number
    /// outside `plan()` is a `Client` error. If the
    /// checkpoint cannot be written the in-memory state is rolled back, so memory
    /// never claims more than disk.
    pub fn record_part(&self, part: Part) -> Result<()> {
        let number = part.number();
        let part_count = self.plan().len();
        if number == 0 || number as usize > part_count {
            return Err(TransferError::Client(format!(
                "transaction {}: part {} outside plan 1..={}",
                self.id, number, part_count
            )));
        }
        let mut progress = self.lock();
        self.ensure_active(&progress)?;
        let previous = progress.parts.insert(number, part);
        progress.version += 1;
        if let Err(e) = self.persist(&progress) {
            match previous {
                Some(p) => progress.parts.insert(number, p),
                None => progress.parts.remove(&number),
            };
            progress.version -= 1;
            return Err(e);
        }
        tracing::debug!(id = %self.id, part = number, version = progress.version, "recorded part");
        Ok(())
    }

    /// Known parts, ascending by number.
    pub fn completed_parts(&self) -> Vec<Part> {
        self.lock().parts.values().cloned().collect()
    }

    /// Bytes covered by recorded parts.
    pub fn completed_bytes(&self) -> u64 {
        self.lock().parts.values().map(Part::size).sum()
    }

    /// Part ranges for the whole object.
    pub fn plan(&self) -> Vec<PartRange> {
        plan_parts(self.source.size(), self.options.part_size)
    }

    /// Ranges of `plan()` that have no recorded part yet.
    pub fn pending_ranges(&self) -> Vec<PartRange> {
        pending_ranges(&self.plan(), &self.lock().parts)
    }

    /// Commit the transfer through `commit`, which receives the parts in
    /// ascending order. On success the transaction is finalized and its
    /// checkpoint deleted; on failure it stays active with the checkpoint intact.
    pub fn finalize_with<F>(&self, commit: F) -> Result<()>
    where
        F: FnOnce(&[Part]) -> Result<()>,
    {
        let mut progress = self.lock();
        self.ensure_active(&progress)?;
        let plan = self.plan();
        let missing: Vec<u32> = pending_ranges(&plan, &progress.parts)
            .iter()
            .map(|r| r.number)
            .collect();
        if !missing.is_empty() {
            return Err(TransferError::Client(format!(
                "transaction {} cannot finalize: parts {:?} missing",
                self.id, missing
            )));
        }
        let parts: Vec<Part> = plan
            .iter()
            .filter_map(|r| progress.parts.get(&r.number).cloned())
            .collect();
        commit(&parts)?;
        progress.state = TransactionState::Finalized;
        remove_checkpoint(&self.options.cpt_file)?;
        tracing::info!(id = %self.id, parts = parts.len(), "finalized transaction");
        Ok(())
    }

    /// Compose an upload from its recorded parts (single attempt).
    pub fn finalize(&self, transport: &dyn Transport) -> Result<()> {
        if self.kind != TransferKind::Upload {
            return Err(TransferError::Client(format!(
                "transaction {} is a download; it is finalized by its driver",
                self.id
            )));
        }
        self.finalize_with(|parts| {
            transport
                .complete(&self.bucket, &self.object, &self.id, parts)
                .map_err(|e| RetryFailure::single(e).into_transfer_error(&self.id, None))
        })
    }

    /// Cancel the transfer: release the remote upload (uploads) or remove the
    /// temp file (downloads), then delete the checkpoint whatever the outcome.
    /// A failed remote cancel is still returned.
    pub fn abort(&self, transport: &dyn Transport) -> Result<()> {
        let mut progress = self.lock();
        self.ensure_active(&progress)?;
        progress.state = TransactionState::Aborted;

        let released = match self.kind {
            TransferKind::Upload => transport
                .cancel(&self.bucket, &self.object, &self.id)
                .map_err(|e| RetryFailure::single(e).into_transfer_error(&self.id, None)),
            TransferKind::Download => {
                let temp = storage::temp_path(&self.file);
                match std::fs::remove_file(&temp) {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(TransferError::io(format!("remove {}", temp.display()), e)),
                }
            }
        };
        let removed = remove_checkpoint(&self.options.cpt_file);
        match &released {
            Ok(()) => tracing::info!(id = %self.id, "aborted transaction"),
            Err(e) => tracing::warn!(id = %self.id, "aborted transaction; remote cleanup failed: {}", e),
        }
        released?;
        removed
    }

    /// Drive the transfer to completion with `driver`.
    pub fn run(&self, driver: &Driver) -> Result<TransferSummary> {
        driver.run(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    /// Source file for uploads, destination for downloads.
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    pub fn source(&self) -> &SourceMeta {
        &self.source
    }

    pub fn state(&self) -> TransactionState {
        self.lock().state
    }

    /// Number of parts recorded over the transaction's lifetime, including replacements.
    pub fn version(&self) -> u64 {
        self.lock().version
    }
}

fn current_source(transport: &dyn Transport, request: &TransferRequest, context: &str) -> Result<SourceMeta> {
    match request.kind {
        TransferKind::Upload => SourceMeta::of_file(&request.file)
            .map_err(|e| TransferError::io(format!("stat source {}", request.file.display()), e)),
        TransferKind::Download => transport
            .head_object(&request.bucket, &request.object)
            .map(SourceMeta::from)
            .map_err(|e| RetryFailure::single(e).into_transfer_error(context, None)),
    }
}
