//! Read, write and remove checkpoint files.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::digest::content_md5;
use crate::error::{Result, TransferError};

/// Reserved key holding the content digest.
pub const DIGEST_KEY: &str = "md5";

const TEMP_SUFFIX: &str = ".tmp";

fn temp_checkpoint_path(file: &Path) -> PathBuf {
    let mut o = file.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

fn broken(file: &Path, reason: impl Into<String>) -> TransferError {
    TransferError::CheckpointBroken {
        path: file.to_path_buf(),
        reason: reason.into(),
    }
}

fn encode(states: &Map<String, Value>, file: &Path) -> Result<Vec<u8>> {
    serde_json::to_vec(states)
        .map_err(|e| TransferError::io(format!("encode checkpoint {}", file.display()), e.into()))
}

/// Persist `states` to `file`, adding the `md5` digest of their canonical encoding.
///
/// Any digest already present in `states` is recomputed. The previous content of
/// `file` is replaced atomically. Returns the path written.
pub fn write_checkpoint(states: &Map<String, Value>, file: &Path) -> Result<PathBuf> {
    let mut states = states.clone();
    states.remove(DIGEST_KEY);
    let digest = content_md5(&encode(&states, file)?);
    states.insert(DIGEST_KEY.to_string(), Value::String(digest));
    let body = encode(&states, file)?;

    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| TransferError::io(format!("create dir {}", parent.display()), e))?;
    }
    let tmp = temp_checkpoint_path(file);
    let write = || -> io::Result<()> {
        let mut f = File::create(&tmp)?;
        f.write_all(&body)?;
        f.sync_all()?;
        fs::rename(&tmp, file)
    };
    write().map_err(|e| TransferError::io(format!("write checkpoint {}", file.display()), e))?;
    Ok(file.to_path_buf())
}

/// Load and verify the checkpoint at `file`, returning its states without the digest.
///
/// Fails with `CheckpointBroken` when the content is not a JSON object, the `md5`
/// field is missing, or it does not match the rest of the content.
pub fn load_checkpoint(file: &Path) -> Result<Map<String, Value>> {
    let bytes = fs::read(file)
        .map_err(|e| TransferError::io(format!("read checkpoint {}", file.display()), e))?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| broken(file, format!("undecodable content: {}", e)))?;
    let Value::Object(mut states) = value else {
        return Err(broken(file, "content is not an object"));
    };
    let stored = match states.remove(DIGEST_KEY) {
        Some(Value::String(s)) => s,
        Some(_) => return Err(broken(file, "md5 is not a string")),
        None => return Err(broken(file, "missing md5")),
    };
    if stored != content_md5(&encode(&states, file)?) {
        return Err(broken(file, "unmatched checkpoint md5"));
    }
    Ok(states)
}

/// Delete the checkpoint (and any temp file a crashed write left behind).
/// A checkpoint that is already gone is not an error.
pub fn remove_checkpoint(file: &Path) -> Result<()> {
    for path in [temp_checkpoint_path(file), file.to_path_buf()] {
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(TransferError::io(format!("remove checkpoint {}", path.display()), e))
            }
        }
    }
    Ok(())
}
