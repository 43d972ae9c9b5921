//! Constraint enforcement.
//!
//! Every row write passes through field validation, reference checks, the
//! comment forest check and the unique index before it is staged. Purges go
//! through the [`CascadeExecutor`].

mod cascade;
pub(crate) mod tree;
mod unique_index;
pub(crate) mod validator;

pub use cascade::{CascadeExecutor, CascadeResult};
pub use unique_index::{unique_entries, UniqueKey};

pub(crate) use unique_index::{claim, release};
