//! Transfer options and the request a transaction is started or resumed for.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferError};
use crate::progress::{ProgressCallback, ProgressStats};

/// Checkpoint suffix appended to the local file when no explicit path is given.
pub const CHECKPOINT_SUFFIX: &str = ".cpt";

/// Options a transaction is created with. Everything except the progress hook is
/// persisted in the checkpoint and must match on resume.
#[derive(Clone, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Bytes per part (the last part may be shorter).
    pub part_size: u64,
    /// Checkpoint file path.
    pub cpt_file: PathBuf,
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl TransferOptions {
    pub fn new(part_size: u64, cpt_file: impl Into<PathBuf>) -> Self {
        TransferOptions {
            part_size,
            cpt_file: cpt_file.into(),
            progress_callback: None,
        }
    }

    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(&ProgressStats) + Send + Sync + 'static,
    {
        self.progress_callback = Some(std::sync::Arc::new(f));
        self
    }

    pub(crate) fn report(&self, stats: &ProgressStats) {
        if let Some(cb) = &self.progress_callback {
            cb(stats);
        }
    }
}

impl PartialEq for TransferOptions {
    fn eq(&self, other: &Self) -> bool {
        self.part_size == other.part_size && self.cpt_file == other.cpt_file
    }
}

impl fmt::Debug for TransferOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferOptions")
            .field("part_size", &self.part_size)
            .field("cpt_file", &self.cpt_file)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Upload,
    Download,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferKind::Upload => write!(f, "upload"),
            TransferKind::Download => write!(f, "download"),
        }
    }
}

/// What the caller wants transferred: direction, remote target, local file, options.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub kind: TransferKind,
    pub bucket: String,
    pub object: String,
    /// Source file for uploads, destination file for downloads.
    pub file: PathBuf,
    pub options: TransferOptions,
}

impl TransferRequest {
    pub fn upload(
        bucket: impl Into<String>,
        object: impl Into<String>,
        file: impl Into<PathBuf>,
        options: TransferOptions,
    ) -> Self {
        Self::new(TransferKind::Upload, bucket.into(), object.into(), file.into(), options)
    }

    pub fn download(
        bucket: impl Into<String>,
        object: impl Into<String>,
        file: impl Into<PathBuf>,
        options: TransferOptions,
    ) -> Self {
        Self::new(TransferKind::Download, bucket.into(), object.into(), file.into(), options)
    }

    fn new(kind: TransferKind, bucket: String, object: String, file: PathBuf, options: TransferOptions) -> Self {
        TransferRequest {
            kind,
            bucket,
            object,
            file,
            options,
        }
    }

    /// Default checkpoint path for a local file: `<file>.cpt`.
    pub fn default_checkpoint_path(file: &std::path::Path) -> PathBuf {
        let mut o = file.as_os_str().to_owned();
        o.push(CHECKPOINT_SUFFIX);
        PathBuf::from(o)
    }

    /// Reject missing or nonsensical arguments before anything touches the network.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.bucket.is_empty() {
            missing.push("bucket");
        }
        if self.object.is_empty() {
            missing.push("object");
        }
        if self.file.as_os_str().is_empty() {
            missing.push("file");
        }
        if self.options.cpt_file.as_os_str().is_empty() {
            missing.push("cpt_file");
        }
        if !missing.is_empty() {
            return Err(TransferError::Client(format!(
                "missing arguments: {}",
                missing.join(", ")
            )));
        }
        if self.options.part_size == 0 {
            return Err(TransferError::Client("part_size must be greater than 0".to_string()));
        }
        if self.options.cpt_file == self.file {
            return Err(TransferError::Client(format!(
                "checkpoint path must differ from the transfer file: {}",
                self.file.display()
            )));
        }
        Ok(())
    }
}
