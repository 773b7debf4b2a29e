//! Range math and part planning.
//!
//! Splits an object into fixed-size, 1-numbered byte ranges and works out which
//! of them still need a transfer given the parts already recorded.

mod range;

pub use range::{effective_part_size, pending_ranges, plan_parts, PartRange, MAX_PARTS};
