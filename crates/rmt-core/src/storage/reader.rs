//! Positional reader for upload sources.

use std::fs::File;
use std::io;
use std::path::Path;

use super::positional;
use crate::partition::PartRange;

/// Read-only handle on an upload source. `read_range` does not move a shared
/// cursor, so worker threads read their parts concurrently.
pub struct SourceReader {
    file: File,
    len: u64,
}

impl SourceReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(SourceReader { file, len })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read exactly the bytes of `range`. A source that shrank underneath us
    /// surfaces as `UnexpectedEof`. Safe to call from several threads at once.
    pub fn read_range(&self, range: &PartRange) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; range.len() as usize];
        positional::read_exact_at(&self.file, &mut buf, range.start)?;
        Ok(buf)
    }
}
