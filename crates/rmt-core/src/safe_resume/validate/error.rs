//! Error types for safe-resume validation.

use std::fmt;

/// Fields of a stored request that differ from the caller's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMismatch {
    pub fields: Vec<&'static str>,
}

impl fmt::Display for RequestMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} differ", self.fields.join(", "))
    }
}

impl std::error::Error for RequestMismatch {}

/// The source behind a transfer is not the one the checkpoint was written against.
#[derive(Debug)]
pub struct SourceMismatch {
    pub kind: SourceMismatchKind,
}

#[derive(Debug)]
pub enum SourceMismatchKind {
    /// Size, ETag or modification time changed; the recorded parts are stale.
    Changed {
        size_changed: bool,
        etag_changed: bool,
        modified_changed: bool,
    },
    /// A file source was compared with an object source or vice versa.
    KindChanged,
}

impl fmt::Display for SourceMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SourceMismatchKind::Changed {
                size_changed,
                etag_changed,
                modified_changed,
            } => {
                write!(f, "source changed")?;
                let mut first = true;
                for (flag, name) in [
                    (*size_changed, "size"),
                    (*etag_changed, "ETag"),
                    (*modified_changed, "modified time"),
                ] {
                    if !flag {
                        continue;
                    }
                    if first {
                        write!(f, " ({}", name)?;
                        first = false;
                    } else {
                        write!(f, ", {}", name)?;
                    }
                }
                if !first {
                    write!(f, ")")?;
                }
                write!(f, "; remove the checkpoint to discard recorded parts and start over")
            }
            SourceMismatchKind::KindChanged => write!(f, "source type changed"),
        }
    }
}

impl std::error::Error for SourceMismatch {}
