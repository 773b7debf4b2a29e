//! Logging init and the per-transfer span.
//!
//! Events go to `~/.local/state/rmt/rmt.log`, or to stderr when the state dir is
//! unusable. Every event emitted while a transfer runs, including those from
//! part workers, carries the transfer's `id` and `kind` through `transfer_span`.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Span;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::multipart::Transaction;

/// Filter used when neither `RMT_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "info,rmt_core=debug,rmt=debug";

/// Env var checked before `RUST_LOG`.
pub const FILTER_ENV: &str = "RMT_LOG";

/// Path of the log file under the XDG state dir.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rmt")?;
    Ok(xdg_dirs.get_state_home().join("rmt.log"))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn install<W>(writer: W, ansi: bool)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(ansi)
        // Closing a transfer span logs how long the transfer ran.
        .with_span_events(FmtSpan::CLOSE)
        .init();
}

/// Initialize structured logging to the file at `log_file_path()`.
/// Returns Err when the log dir is unwritable so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    install(Mutex::new(file), false);
    tracing::info!("rmt logging initialized at {}", path.display());
    Ok(())
}

/// Initialize logging to stderr only. Used when `init_logging()` fails.
pub fn init_logging_stderr() {
    install(std::io::stderr, false);
}

/// Span covering one run of `txn`. Enter it on every thread that works for the
/// transfer.
pub fn transfer_span(txn: &Transaction) -> Span {
    tracing::info_span!(
        "transfer",
        id = %txn.id(),
        kind = %txn.kind(),
        bucket = %txn.bucket(),
        object = %txn.object(),
    )
}
