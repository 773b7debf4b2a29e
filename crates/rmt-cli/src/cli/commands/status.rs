//! `rmt status` – show what a checkpoint records.

use anyhow::{Context, Result};
use rmt_core::Transaction;
use std::path::Path;

pub fn run_status(checkpoint: &Path) -> Result<()> {
    let txn = Transaction::open(checkpoint)
        .with_context(|| format!("open checkpoint {}", checkpoint.display()))?;
    let total = txn.plan().len();
    let done = txn.completed_parts().len();
    let size = txn.source().size();

    println!("{:<10} {}", "ID", txn.id());
    println!("{:<10} {}", "KIND", txn.kind());
    println!("{:<10} {}/{}", "TARGET", txn.bucket(), txn.object());
    println!("{:<10} {}", "FILE", txn.file().display());
    println!("{:<10} {}", "CREATED", txn.creation_time().to_rfc3339());
    println!("{:<10} {} of {} ({} / {} bytes)", "PARTS", done, total, txn.completed_bytes(), size);
    println!("{:<10} {}", "PART SIZE", txn.options().part_size);
    println!("{:<10} {}", "VERSION", txn.version());
    Ok(())
}
