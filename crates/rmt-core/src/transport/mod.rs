//! Boundary to the object-storage service.
//!
//! The core never issues network requests itself: signing, endpoints and HTTP
//! plumbing live behind `Transport`. Implementations are shared by all driver
//! worker threads, so they must be `Send + Sync`.

mod error;
mod local;

use chrono::{DateTime, Utc};

use crate::multipart::{Part, TransferOptions};
use crate::partition::PartRange;

pub use error::TransportError;
pub use local::LocalStore;

/// Metadata of a remote object, as returned by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub size: u64,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

/// Calls a multipart transfer makes against the storage service.
pub trait Transport: Send + Sync {
    /// Register a multipart upload; returns the id the service assigned.
    fn initiate(&self, bucket: &str, object: &str, options: &TransferOptions) -> Result<String, TransportError>;

    /// Upload the bytes of `range` as part `number`.
    fn upload_part(
        &self,
        bucket: &str,
        object: &str,
        transaction_id: &str,
        number: u32,
        range: &PartRange,
        body: &[u8],
    ) -> Result<Part, TransportError>;

    /// Fetch the bytes of `range` as part `number`.
    fn download_part(
        &self,
        bucket: &str,
        object: &str,
        transaction_id: &str,
        number: u32,
        range: &PartRange,
    ) -> Result<(Vec<u8>, Part), TransportError>;

    /// Compose the object from `parts`, which are ordered ascending by number.
    fn complete(&self, bucket: &str, object: &str, transaction_id: &str, parts: &[Part]) -> Result<(), TransportError>;

    /// Release the remote multipart slot and any parts uploaded to it.
    fn cancel(&self, bucket: &str, object: &str, transaction_id: &str) -> Result<(), TransportError>;

    fn head_object(&self, bucket: &str, object: &str) -> Result<ObjectMeta, TransportError>;
}
