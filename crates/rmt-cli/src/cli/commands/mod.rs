//! CLI command handlers. Each command is in its own file.

mod abort;
mod progress;
mod status;
mod target;
mod transfer;

pub use abort::run_abort;
pub use status::run_status;
pub use target::{absolute, parse_size, parse_target, store_root};
pub use transfer::run_transfer;
