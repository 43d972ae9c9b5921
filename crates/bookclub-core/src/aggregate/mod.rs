//! Derived aggregates.
//!
//! Per-book statistics, the listing `reviewed` flag and friendships are
//! maintained synchronously by hooks that run inside the transaction of
//! the write that affects them.

mod book_stats;
mod maintainer;

pub use book_stats::BookStats;

pub(crate) use maintainer::{after_write, derive_fields, rebuild, verify};
