//! Classify transport failures into retry policy error kinds.

use crate::retry::policy::ErrorKind;
use crate::transport::TransportError;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Server(code),
        408 => ErrorKind::Timeout,
        _ => ErrorKind::Fatal,
    }
}

/// Classify a transport error into an ErrorKind.
pub fn classify(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::Timeout => ErrorKind::Timeout,
        TransportError::Connection(_) => ErrorKind::Connection,
        TransportError::Http { status, .. } => classify_http_status(*status),
        TransportError::PartialTransfer { .. } => ErrorKind::Connection,
        TransportError::Io(_) => ErrorKind::Fatal,
    }
}
