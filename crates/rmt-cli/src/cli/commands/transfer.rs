//! `rmt upload` / `rmt download`: start or resume a transfer and drive it to completion.

use anyhow::{Context, Result};
use rmt_core::config::RmtConfig;
use rmt_core::driver::run_blocking;
use rmt_core::multipart::CHECKPOINT_SUFFIX;
use rmt_core::retry::RetryPolicy;
use rmt_core::{Driver, LocalStore, Transaction, TransferError, TransferKind, TransferOptions, TransferRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::progress::spawn_printer;
use super::{absolute, parse_target, store_root};
use crate::cli::TransferArgs;

pub async fn run_transfer(
    cfg: &RmtConfig,
    kind: TransferKind,
    file: &Path,
    target: &str,
    args: &TransferArgs,
) -> Result<()> {
    let (bucket, object) = parse_target(target)?;
    let root = store_root(args.store.as_deref(), cfg)?;
    let file_buf = absolute(file)?;
    let file = file_buf.as_path();
    let cpt = absolute(&checkpoint_path(cfg, file, args.checkpoint.as_deref()))?;
    let part_size = args.part_size.unwrap_or(cfg.part_size);
    let jobs = args.jobs.unwrap_or(cfg.max_concurrent_parts);

    let (progress_tx, progress_handle) = spawn_printer();
    let options = TransferOptions::new(part_size, &cpt).with_progress(move |stats| {
        let _ = progress_tx.try_send(stats.clone());
    });
    let request = match kind {
        TransferKind::Upload => TransferRequest::upload(&bucket, &object, file, options),
        TransferKind::Download => TransferRequest::download(&bucket, &object, file, options),
    };

    let transport = Arc::new(LocalStore::new(root));
    let store = Arc::clone(&transport);
    let txn = tokio::task::spawn_blocking(move || Transaction::start_or_resume(store.as_ref(), request))
        .await
        .context("transfer setup task join")??;
    let txn = Arc::new(txn);
    let id = txn.id().to_string();
    let recorded = txn.completed_parts().len();
    if recorded > 0 {
        println!("Resuming {} {} ({} part(s) already recorded)", kind, id, recorded);
    }

    let driver = Driver::new(transport)
        .with_retry_policy(RetryPolicy::from_config(&cfg.retry_config()))
        .with_max_concurrent(jobs);
    let result = run_blocking(driver, txn).await;
    let _ = progress_handle.await;

    match result {
        Ok(summary) => {
            println!(
                "{} {} {} {}/{}: {} part(s), {} transferred now ({} bytes)",
                match kind {
                    TransferKind::Upload => "Uploaded",
                    TransferKind::Download => "Downloaded",
                },
                file.display(),
                match kind {
                    TransferKind::Upload => "->",
                    TransferKind::Download => "<-",
                },
                bucket,
                object,
                summary.parts_total,
                summary.parts_transferred,
                summary.bytes_transferred
            );
            tracing::info!(id = %id, "{} finished", kind);
            Ok(())
        }
        Err(err) => {
            let resumable = err
                .downcast_ref::<TransferError>()
                .is_some_and(TransferError::is_resumable);
            if resumable {
                eprintln!(
                    "Checkpoint kept at {}; rerun the same command to resume.",
                    cpt.display()
                );
            }
            Err(err.context(format!("{} {}", kind, id)))
        }
    }
}

/// Explicit path, else `<checkpoint_dir>/<file name>.cpt`, else `<file>.cpt`.
fn checkpoint_path(cfg: &RmtConfig, file: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    match (&cfg.checkpoint_dir, file.file_name()) {
        (Some(dir), Some(name)) => {
            let mut name = name.to_os_string();
            name.push(CHECKPOINT_SUFFIX);
            dir.join(name)
        }
        _ => TransferRequest::default_checkpoint_path(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_defaults_next_to_file() {
        let cfg = RmtConfig::default();
        assert_eq!(
            checkpoint_path(&cfg, Path::new("/data/a.bin"), None),
            PathBuf::from("/data/a.bin.cpt")
        );
    }

    #[test]
    fn checkpoint_dir_from_config() {
        let cfg = RmtConfig {
            checkpoint_dir: Some(PathBuf::from("/var/lib/rmt")),
            ..RmtConfig::default()
        };
        assert_eq!(
            checkpoint_path(&cfg, Path::new("/data/a.bin"), None),
            PathBuf::from("/var/lib/rmt/a.bin.cpt")
        );
        assert_eq!(
            checkpoint_path(&cfg, Path::new("/data/a.bin"), Some(Path::new("x.cpt"))),
            PathBuf::from("x.cpt")
        );
    }
}
