//! Identity of the data behind a transfer.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transport::ObjectMeta;

/// Snapshot of what a transfer reads from, recorded when it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceMeta {
    /// Local source file of an upload.
    File {
        size: u64,
        modified: Option<DateTime<Utc>>,
    },
    /// Remote object of a download.
    Object {
        size: u64,
        etag: String,
        last_modified: DateTime<Utc>,
    },
}

impl SourceMeta {
    /// Stat a local upload source.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let md = std::fs::metadata(path)?;
        if !md.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        Ok(SourceMeta::File {
            size: md.len(),
            modified: md.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    pub fn size(&self) -> u64 {
        match self {
            SourceMeta::File { size, .. } | SourceMeta::Object { size, .. } => *size,
        }
    }
}

impl From<ObjectMeta> for SourceMeta {
    fn from(m: ObjectMeta) -> Self {
        SourceMeta::Object {
            size: m.size,
            etag: m.etag,
            last_modified: m.last_modified,
        }
    }
}
