//! Run a transaction on the blocking thread pool from async code.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::{Driver, TransferSummary};
use crate::multipart::Transaction;

/// Runs `txn` with `driver` in `spawn_blocking`. Transfer errors come back as
/// the inner `TransferError` so callers can downcast and inspect them.
pub async fn run_blocking(driver: Driver, txn: Arc<Transaction>) -> Result<TransferSummary> {
    tokio::task::spawn_blocking(move || txn.run(&driver))
        .await
        .context("transfer task join")?
        .map_err(anyhow::Error::from)
}
