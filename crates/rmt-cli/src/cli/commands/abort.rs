//! `rmt abort` – cancel the transfer behind a checkpoint and delete the checkpoint.

use anyhow::{Context, Result};
use rmt_core::config::RmtConfig;
use rmt_core::{LocalStore, Transaction};
use std::path::Path;

use super::store_root;

pub fn run_abort(cfg: &RmtConfig, checkpoint: &Path, store: Option<&Path>) -> Result<()> {
    let root = store_root(store, cfg)?;
    let txn = Transaction::open(checkpoint)
        .with_context(|| format!("open checkpoint {}", checkpoint.display()))?;
    txn.abort(&LocalStore::new(root))
        .with_context(|| format!("abort {} {}", txn.kind(), txn.id()))?;
    println!("Aborted {} {} ({}/{})", txn.kind(), txn.id(), txn.bucket(), txn.object());
    Ok(())
}
