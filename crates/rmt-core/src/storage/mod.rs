//! Local file side of a transfer.
//!
//! Uploads read part ranges from the source file with positional reads.
//! Downloads write into a preallocated temp file (fallocate on Linux when
//! available, else set_len) with concurrent offset writes (pwrite), and finalize
//! with an atomic rename from `.part` to the destination.

mod builder;
mod positional;
mod reader;
mod writer;

pub use builder::StorageWriterBuilder;
pub use reader::SourceReader;
pub use writer::StorageWriter;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
