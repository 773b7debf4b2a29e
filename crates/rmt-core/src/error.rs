//! Typed errors surfaced by the transaction, checkpoint and driver layers.
//!
//! Transport-level failures are classified and retried inside the driver; only
//! what survives the retry budget reaches callers as a `TransferError`.

use std::path::PathBuf;

use crate::multipart::TransactionState;
use crate::transport::TransportError;

/// Result alias for the core transfer API.
pub type Result<T, E = TransferError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Checkpoint file is unreadable as a checkpoint: missing or mismatched digest,
    /// or undecodable content. The caller must start a fresh transfer.
    #[error("checkpoint broken ({}): {reason}", path.display())]
    CheckpointBroken { path: PathBuf, reason: String },

    /// Checkpoint is intact but belongs to a different request.
    #[error("checkpoint {} does not match request: {mismatch}", path.display())]
    CheckpointInvalid { path: PathBuf, mismatch: String },

    /// The data behind a resumable transfer changed since the checkpoint was written.
    #[error("transaction {transaction_id}: {detail}")]
    SourceChanged {
        transaction_id: String,
        detail: String,
    },

    /// Retryable failure that exhausted the retry budget. The checkpoint stays usable.
    #[error("transaction {transaction_id}{}: gave up after {attempts} attempts: {source}", part_suffix(*part_number))]
    TransientTransfer {
        transaction_id: String,
        part_number: Option<u32>,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// Non-retryable failure (authorization, missing bucket/object, quota).
    /// `transaction_id` is `bucket/object` when the failure happened before an id existed.
    #[error("transaction {transaction_id}{}: {source}", part_suffix(*part_number))]
    FatalTransfer {
        transaction_id: String,
        part_number: Option<u32>,
        #[source]
        source: TransportError,
    },

    /// Invalid or missing arguments supplied by the caller.
    #[error("client error: {0}")]
    Client(String),

    /// Operation not legal in the transaction's current state.
    #[error("transaction {transaction_id} is {state}")]
    InvalidState {
        transaction_id: String,
        state: TransactionState,
    },

    /// The run stopped because abort was requested.
    #[error("transaction {transaction_id} aborted")]
    Aborted { transaction_id: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

fn part_suffix(part_number: Option<u32>) -> String {
    part_number
        .map(|n| format!(" part {}", n))
        .unwrap_or_default()
}

impl TransferError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TransferError::Io {
            context: context.into(),
            source,
        }
    }

    /// True if a later run may pick up from the same checkpoint.
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            TransferError::TransientTransfer { .. }
                | TransferError::FatalTransfer { .. }
                | TransferError::Io { .. }
        )
    }
}
