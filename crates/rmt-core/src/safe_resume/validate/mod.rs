//! Compares a checkpoint with the current request and the current source.

mod error;

use crate::checkpoint::CheckpointState;
use crate::multipart::TransferRequest;

use super::SourceMeta;

pub use error::{RequestMismatch, SourceMismatch, SourceMismatchKind};

/// Returns Ok(()) if `stored` was written for exactly this request.
///
/// The progress callback is not part of the comparison; everything else the
/// checkpoint records about the request is.
pub fn validate_request(stored: &CheckpointState, request: &TransferRequest) -> Result<(), RequestMismatch> {
    let mut fields = Vec::new();
    if stored.kind != request.kind {
        fields.push("kind");
    }
    if stored.bucket != request.bucket {
        fields.push("bucket");
    }
    if stored.object != request.object {
        fields.push("object");
    }
    if stored.file != request.file {
        fields.push("file");
    }
    if stored.options.part_size != request.options.part_size {
        fields.push("part_size");
    }
    if stored.options.cpt_file != request.options.cpt_file {
        fields.push("cpt_file");
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(RequestMismatch { fields })
    }
}

/// Returns Ok(()) if the source is unchanged since `stored` was recorded.
///
/// Upload sources compare size and modification time; download sources compare
/// size, ETag and Last-Modified.
pub fn validate_source(stored: &SourceMeta, current: &SourceMeta) -> Result<(), SourceMismatch> {
    match (stored, current) {
        (
            SourceMeta::File { size: a, modified: ma },
            SourceMeta::File { size: b, modified: mb },
        ) => changed(a != b, false, ma != mb),
        (
            SourceMeta::Object {
                size: a,
                etag: ea,
                last_modified: la,
            },
            SourceMeta::Object {
                size: b,
                etag: eb,
                last_modified: lb,
            },
        ) => changed(a != b, ea != eb, la != lb),
        _ => Err(SourceMismatch {
            kind: SourceMismatchKind::KindChanged,
        }),
    }
}

fn changed(size_changed: bool, etag_changed: bool, modified_changed: bool) -> Result<(), SourceMismatch> {
    if size_changed || etag_changed || modified_changed {
        return Err(SourceMismatch {
            kind: SourceMismatchKind::Changed {
                size_changed,
                etag_changed,
                modified_changed,
            },
        });
    }
    Ok(())
}
