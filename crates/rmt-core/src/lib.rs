pub mod config;
pub mod logging;

// Transfer core
pub mod checkpoint;
pub mod control;
pub mod driver;
pub mod error;
pub mod multipart;
pub mod partition;
pub mod progress;
pub mod retry;
pub mod safe_resume;
pub mod storage;
pub mod transport;

pub use control::AbortHandle;
pub use driver::{Driver, TransferSummary};
pub use error::{Result, TransferError};
pub use multipart::{Part, Transaction, TransactionState, TransferKind, TransferOptions, TransferRequest};
pub use transport::{LocalStore, ObjectMeta, Transport, TransportError};
