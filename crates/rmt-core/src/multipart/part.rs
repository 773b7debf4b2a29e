//! A part accepted by the remote side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One transferred chunk of an object. A `Part` records a fact (the remote side
/// accepted these bytes), so it has no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    number: u32,
    etag: String,
    size: u64,
    last_modified: DateTime<Utc>,
}

impl Part {
    pub fn new(number: u32, etag: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        Part {
            number,
            etag: etag.into(),
            size,
            last_modified,
        }
    }

    /// 1-based position within the object.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn etag(&self) -> &str {
        &self.etag
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }
}
