//! Transport error type for retry classification.

use std::fmt;

/// Error returned by a single transport call. The driver classifies it for retry,
/// then wraps what survives in a `TransferError` with transaction context.
#[derive(Debug)]
pub enum TransportError {
    /// The request timed out (connect or read).
    Timeout,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection(String),
    /// The service answered with a non-2xx status.
    Http { status: u16, message: String },
    /// A part arrived with fewer or more bytes than its range (e.g. server closed early).
    PartialTransfer { expected: u64, received: u64 },
    /// Local read/write failed (e.g. disk full, permission denied). Not retried.
    Io(std::io::Error),
}

impl TransportError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        TransportError::Http {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "operation timed out"),
            TransportError::Connection(msg) => write!(f, "connection failed: {}", msg),
            TransportError::Http { status, message } => write!(f, "HTTP {}: {}", status, message),
            TransportError::PartialTransfer { expected, received } => {
                write!(f, "partial transfer: expected {} bytes, got {}", expected, received)
            }
            TransportError::Io(e) => write!(f, "io: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}
