//! Typed view of a checkpoint's states.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::store::{load_checkpoint, write_checkpoint};
use crate::error::{Result, TransferError};
use crate::multipart::{Part, TransferKind, TransferOptions};
use crate::safe_resume::SourceMeta;

/// Everything a transaction persists. Parts are stored ascending by number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub id: String,
    pub kind: TransferKind,
    pub bucket: String,
    pub object: String,
    pub file: PathBuf,
    pub options: TransferOptions,
    pub creation_time: DateTime<Utc>,
    /// Bumped on every recorded part.
    pub version: u64,
    pub source: SourceMeta,
    pub parts: Vec<Part>,
}

impl CheckpointState {
    pub fn to_states(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(states)) => Ok(states),
            Ok(other) => Err(TransferError::io(
                "encode checkpoint state",
                std::io::Error::new(std::io::ErrorKind::InvalidData, format!("not an object: {}", other)),
            )),
            Err(e) => Err(TransferError::io("encode checkpoint state", e.into())),
        }
    }

    /// Decode verified states. A layout this version does not recognize, or a
    /// part number listed twice, makes the checkpoint unusable.
    pub fn from_states(states: Map<String, Value>, path: &Path) -> Result<Self> {
        let state: CheckpointState =
            serde_json::from_value(Value::Object(states)).map_err(|e| TransferError::CheckpointBroken {
                path: path.to_path_buf(),
                reason: format!("unrecognized layout: {}", e),
            })?;
        let mut seen = BTreeSet::new();
        if let Some(dup) = state.parts.iter().find(|p| !seen.insert(p.number())) {
            return Err(TransferError::CheckpointBroken {
                path: path.to_path_buf(),
                reason: format!("part {} listed twice", dup.number()),
            });
        }
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        write_checkpoint(&self.to_states()?, path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_states(load_checkpoint(path)?, path)
    }
}
