//! Durable, digest-protected transaction checkpoints.
//!
//! A checkpoint is a single JSON object holding a transaction's stable fields and
//! every completed part, plus an `md5` field: the base64 MD5 of the canonical
//! encoding of everything else. Keys are always encoded in sorted order, so
//! decoding and re-encoding a checkpoint reproduces the bytes the digest was
//! computed over. Loading recomputes the digest and refuses any mismatch.
//!
//! Writes go to a sibling temp file which is synced and renamed over the target,
//! so a crash mid-write leaves either the previous checkpoint or the new one.
//!
//! Only one transaction may use a checkpoint path at a time. Nothing here locks
//! the file; callers that run several processes must serialize them per path.

mod digest;
mod state;
mod store;

pub use digest::{content_md5, md5_hex};
pub use state::CheckpointState;
pub use store::{load_checkpoint, remove_checkpoint, write_checkpoint, DIGEST_KEY};
