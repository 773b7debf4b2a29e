//! Builder for creating and preallocating download temp files.

use std::fs::File;
use std::io;
use std::path::Path;

use super::writer::StorageWriter;
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Builder for a new temp download file. Call `preallocate` then `build` to get
/// a `StorageWriter` that supports concurrent `write_at` from worker threads.
pub struct StorageWriterBuilder {
    file: File,
    temp_path: std::path::PathBuf,
}

impl StorageWriterBuilder {
    /// Create a new temp file at `temp_path` (e.g. `destination.part`), creating
    /// parent directories. Truncates an existing file.
    pub fn create(temp_path: &Path) -> io::Result<Self> {
        if let Some(parent) = temp_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;
        Ok(StorageWriterBuilder {
            file,
            temp_path: temp_path.to_path_buf(),
        })
    }

    /// Preallocate `size` bytes. On Unix tries `posix_fallocate` for real block
    /// allocation; falls back to `set_len` on failure or non-Unix.
    pub fn preallocate(&mut self, size: u64) -> io::Result<()> {
        #[cfg(unix)]
        if size > 0 {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file.set_len(size)
    }

    /// Finish building and return a writer that can be shared for concurrent writes.
    pub fn build(self) -> StorageWriter {
        StorageWriter::from_file_and_path(self.file, self.temp_path)
    }
}
