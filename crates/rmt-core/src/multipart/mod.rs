//! Multipart transactions and the parts they are made of.
//!
//! A `Transaction` owns one transfer's identity and its checkpoint. Every
//! completed `Part` goes through `Transaction::record_part`, which rewrites the
//! checkpoint before returning, so a crash never loses a part that was reported
//! as recorded.

mod options;
mod part;
mod transaction;

pub use options::{TransferKind, TransferOptions, TransferRequest, CHECKPOINT_SUFFIX};
pub use part::Part;
pub use transaction::{Transaction, TransactionState};
