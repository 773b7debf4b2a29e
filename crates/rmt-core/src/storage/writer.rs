//! Concurrent offset writer for download temp files.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::positional;

/// Writer for a download temp file. Clones share the file; each `write_at` is
/// independent (pwrite-style), so workers can write their parts in parallel.
#[derive(Clone)]
pub struct StorageWriter {
    file: Arc<File>,
    temp_path: PathBuf,
}

impl StorageWriter {
    pub(crate) fn from_file_and_path(file: File, temp_path: PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            temp_path,
        }
    }

    /// Reopen a temp file left by an earlier run (read+write, no truncation).
    /// Its length must equal the object size it was preallocated for.
    pub fn open_existing(temp_path: &Path, expected_len: u64) -> io::Result<Self> {
        let file = File::options().read(true).write(true).open(temp_path)?;
        let len = file.metadata()?.len();
        if len != expected_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "temp file {} is {} bytes, expected {}",
                    temp_path.display(),
                    len,
                    expected_len
                ),
            ));
        }
        Ok(Self::from_file_and_path(file, temp_path.to_path_buf()))
    }

    /// Write `data` at `offset`. Does not move a shared cursor; safe for concurrent use.
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        positional::write_all_at(&self.file, data, offset)
    }

    /// Sync file data to disk. Call before recording a part so the checkpoint never
    /// claims bytes that are still only in the page cache.
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_data()
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Sync, then atomically rename the temp file to the final path. Consumes the
    /// writer. Fails if `final_path` is on a different filesystem.
    pub fn finalize(self, final_path: &Path) -> io::Result<()> {
        self.file.sync_all()?;
        let temp_path = self.temp_path.clone();
        drop(self.file);
        std::fs::rename(&temp_path, final_path)
    }
}
