//! Directory-backed object store.
//!
//! Layout under the root:
//! - `<bucket>/<object key>`: committed objects (keys may contain `/`).
//! - `.multipart/<upload id>/target`: `bucket\nobject` the upload belongs to.
//! - `.multipart/<upload id>/<number>`: uploaded part bytes.
//!
//! Errors mirror what an HTTP object store answers (404 for a missing bucket,
//! key or upload; 400 for a bad part list) so the retry classifier treats both
//! alike.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};

use super::{ObjectMeta, Transport, TransportError};
use crate::checkpoint::md5_hex;
use crate::multipart::{Part, TransferOptions};
use crate::partition::PartRange;
use crate::storage::SourceReader;

const UPLOADS_DIR: &str = ".multipart";
const TARGET_FILE: &str = "target";
const BUF_SIZE: usize = 64 * 1024;

/// `Transport` over a local directory. Buckets are its subdirectories.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a bucket directory (no error if it exists).
    pub fn create_bucket(&self, bucket: &str) -> std::io::Result<()> {
        fs::create_dir_all(self.root.join(bucket))
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, TransportError> {
        if bucket.is_empty() || bucket == UPLOADS_DIR || bucket.contains(['/', '\\']) {
            return Err(TransportError::http(400, format!("InvalidBucketName: {}", bucket)));
        }
        let dir = self.root.join(bucket);
        if !dir.is_dir() {
            return Err(TransportError::http(404, format!("NoSuchBucket: {}", bucket)));
        }
        Ok(dir)
    }

    fn object_path(&self, bucket: &str, object: &str) -> Result<PathBuf, TransportError> {
        let key = Path::new(object);
        let valid = !object.is_empty() && key.components().all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(TransportError::http(400, format!("InvalidObjectName: {}", object)));
        }
        Ok(self.bucket_dir(bucket)?.join(key))
    }

    fn upload_dir(&self, bucket: &str, object: &str, transaction_id: &str) -> Result<PathBuf, TransportError> {
        let no_such_upload = || TransportError::http(404, format!("NoSuchUpload: {}", transaction_id));
        if transaction_id.is_empty() || transaction_id.contains(['/', '\\', '.']) {
            return Err(no_such_upload());
        }
        let dir = self.root.join(UPLOADS_DIR).join(transaction_id);
        let target = match fs::read_to_string(dir.join(TARGET_FILE)) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(no_such_upload()),
            Err(e) => return Err(e.into()),
        };
        if target != format!("{}\n{}", bucket, object) {
            return Err(no_such_upload());
        }
        Ok(dir)
    }
}

/// Write `data` to a sibling temp file, then rename it over `path`.
fn write_replace(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut f = File::create(&tmp)?;
    f.write_all(data)?;
    f.sync_all()?;
    fs::rename(&tmp, path)
}

fn modified_time(path: &Path) -> std::io::Result<DateTime<Utc>> {
    Ok(DateTime::<Utc>::from(fs::metadata(path)?.modified()?))
}

impl Transport for LocalStore {
    fn initiate(&self, bucket: &str, object: &str, _options: &TransferOptions) -> Result<String, TransportError> {
        self.object_path(bucket, object)?;
        let id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        let dir = self.root.join(UPLOADS_DIR).join(&id);
        fs::create_dir_all(&dir)?;
        write_replace(&dir.join(TARGET_FILE), format!("{}\n{}", bucket, object).as_bytes())?;
        tracing::debug!(bucket, object, upload_id = %id, "initiated multipart upload");
        Ok(id)
    }

    fn upload_part(
        &self,
        bucket: &str,
        object: &str,
        transaction_id: &str,
        number: u32,
        _range: &PartRange,
        body: &[u8],
    ) -> Result<Part, TransportError> {
        let dir = self.upload_dir(bucket, object, transaction_id)?;
        let path = dir.join(number.to_string());
        write_replace(&path, body)?;
        Ok(Part::new(number, md5_hex(body), body.len() as u64, modified_time(&path)?))
    }

    fn download_part(
        &self,
        bucket: &str,
        object: &str,
        _transaction_id: &str,
        number: u32,
        range: &PartRange,
    ) -> Result<(Vec<u8>, Part), TransportError> {
        let path = self.object_path(bucket, object)?;
        let reader = match SourceReader::open(&path) {
            Ok(r) => r,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransportError::http(404, format!("NoSuchKey: {}", object)))
            }
            Err(e) => return Err(e.into()),
        };
        if range.end > reader.len() {
            return Err(TransportError::http(416, format!("InvalidRange: {}", range.range_header_value())));
        }
        let bytes = reader.read_range(range)?;
        let part = Part::new(number, md5_hex(&bytes), bytes.len() as u64, modified_time(&path)?);
        Ok((bytes, part))
    }

    fn complete(&self, bucket: &str, object: &str, transaction_id: &str, parts: &[Part]) -> Result<(), TransportError> {
        let dir = self.upload_dir(bucket, object, transaction_id)?;
        let dest = self.object_path(bucket, object)?;
        if parts.is_empty() {
            return Err(TransportError::http(400, "MalformedXML: no parts"));
        }
        if parts.windows(2).any(|w| w[0].number() >= w[1].number()) {
            return Err(TransportError::http(400, "InvalidPartOrder"));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = dest.as_os_str().to_owned();
        tmp.push(format!(".{}.tmp", transaction_id));
        let tmp = PathBuf::from(tmp);
        let mut out = File::create(&tmp)?;
        for part in parts {
            let data = match fs::read(dir.join(part.number().to_string())) {
                Ok(d) => d,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    let _ = fs::remove_file(&tmp);
                    return Err(TransportError::http(400, format!("InvalidPart: {}", part.number())));
                }
                Err(e) => return Err(e.into()),
            };
            if md5_hex(&data) != part.etag() {
                let _ = fs::remove_file(&tmp);
                return Err(TransportError::http(400, format!("InvalidPart: {} etag mismatch", part.number())));
            }
            out.write_all(&data)?;
        }
        out.sync_all()?;
        fs::rename(&tmp, &dest)?;
        fs::remove_dir_all(&dir)?;
        tracing::debug!(bucket, object, upload_id = transaction_id, parts = parts.len(), "completed multipart upload");
        Ok(())
    }

    fn cancel(&self, bucket: &str, object: &str, transaction_id: &str) -> Result<(), TransportError> {
        let dir = self.upload_dir(bucket, object, transaction_id)?;
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    fn head_object(&self, bucket: &str, object: &str) -> Result<ObjectMeta, TransportError> {
        let path = self.object_path(bucket, object)?;
        let mut file = match File::open(&path) {
            Ok(f) if path.is_file() => f,
            Ok(_) => return Err(TransportError::http(404, format!("NoSuchKey: {}", object))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransportError::http(404, format!("NoSuchKey: {}", object)))
            }
            Err(e) => return Err(e.into()),
        };
        let mut hasher = Md5::new();
        let mut buf = vec![0u8; BUF_SIZE];
        let mut size = 0u64;
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            size += n as u64;
        }
        Ok(ObjectMeta {
            size,
            etag: hex::encode_upper(hasher.finalize()),
            last_modified: modified_time(&path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.create_bucket("bucket").unwrap();
        (dir, store)
    }

    fn range(number: u32, start: u64, end: u64) -> PartRange {
        PartRange { number, start, end }
    }

    fn status(e: TransportError) -> u16 {
        match e {
            TransportError::Http { status, .. } => status,
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[test]
    fn upload_complete_then_download() {
        let (_dir, store) = store();
        let opts = TransferOptions::new(4, "x.cpt");
        let id = store.initiate("bucket", "a/b.txt", &opts).unwrap();
        let p2 = store.upload_part("bucket", "a/b.txt", &id, 2, &range(2, 4, 6), b"ef").unwrap();
        let p1 = store.upload_part("bucket", "a/b.txt", &id, 1, &range(1, 0, 4), b"abcd").unwrap();
        assert_eq!(p1.etag(), md5_hex(b"abcd"));
        assert_eq!(p2.size(), 2);
        store.complete("bucket", "a/b.txt", &id, &[p1, p2]).unwrap();

        let meta = store.head_object("bucket", "a/b.txt").unwrap();
        assert_eq!(meta.size, 6);
        assert_eq!(meta.etag, md5_hex(b"abcdef"));
        let (bytes, part) = store.download_part("bucket", "a/b.txt", "dl", 2, &range(2, 4, 6)).unwrap();
        assert_eq!(bytes, b"ef");
        assert_eq!(part.number(), 2);
        // Upload staging is gone once committed.
        assert_eq!(status(store.cancel("bucket", "a/b.txt", &id).unwrap_err()), 404);
    }

    #[test]
    fn complete_rejects_unordered_or_unknown_parts() {
        let (_dir, store) = store();
        let id = store.initiate("bucket", "k", &TransferOptions::new(1, "k.cpt")).unwrap();
        let p1 = store.upload_part("bucket", "k", &id, 1, &range(1, 0, 1), b"a").unwrap();
        let p2 = store.upload_part("bucket", "k", &id, 2, &range(2, 1, 2), b"b").unwrap();
        assert_eq!(status(store.complete("bucket", "k", &id, &[p2.clone(), p1.clone()]).unwrap_err()), 400);
        let forged = Part::new(1, "0000", 1, Utc::now());
        assert_eq!(status(store.complete("bucket", "k", &id, &[forged, p2]).unwrap_err()), 400);
        assert!(!store.root().join("bucket").join("k").exists());
    }

    #[test]
    fn missing_bucket_and_key_are_404() {
        let (_dir, store) = store();
        let opts = TransferOptions::new(1, "k.cpt");
        assert_eq!(status(store.initiate("nope", "k", &opts).unwrap_err()), 404);
        assert_eq!(status(store.head_object("bucket", "missing").unwrap_err()), 404);
    }

    #[test]
    fn escaping_keys_are_rejected() {
        let (_dir, store) = store();
        let opts = TransferOptions::new(1, "k.cpt");
        assert_eq!(status(store.initiate("bucket", "../outside", &opts).unwrap_err()), 400);
        assert_eq!(status(store.initiate("bucket", "/abs", &opts).unwrap_err()), 400);
    }

    #[test]
    fn cancel_removes_upload() {
        let (_dir, store) = store();
        let id = store.initiate("bucket", "k", &TransferOptions::new(1, "k.cpt")).unwrap();
        store.upload_part("bucket", "k", &id, 1, &range(1, 0, 1), b"a").unwrap();
        store.cancel("bucket", "k", &id).unwrap();
        assert_eq!(status(store.upload_part("bucket", "k", &id, 2, &range(2, 1, 2), b"b").unwrap_err()), 404);
    }

    #[test]
    fn upload_id_is_bound_to_its_object() {
        let (_dir, store) = store();
        let id = store.initiate("bucket", "k", &TransferOptions::new(1, "k.cpt")).unwrap();
        assert_eq!(status(store.cancel("bucket", "other", &id).unwrap_err()), 404);
    }
}
