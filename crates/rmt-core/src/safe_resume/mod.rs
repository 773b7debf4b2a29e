//! Safe resume: refuse to reuse a checkpoint for anything but the transfer it
//! was written for.
//!
//! Two checks run when a transaction is resumed. The stored request (direction,
//! bucket, object, local file, options) must equal the caller's, and the data
//! behind the transfer (upload source file, or remote object for downloads) must
//! be unchanged since the checkpoint was written.

mod meta;
mod validate;

pub use meta::SourceMeta;
pub use validate::{
    validate_request, validate_source, RequestMismatch, SourceMismatch, SourceMismatchKind,
};
