//! Bookclub Core - relational consistency and derived aggregates.
//!
//! An embedded store for the book club schema that enforces unique keys,
//! reference rules with cascade and set-null behavior, the comment reply
//! forest, and trigger-style statistics, all inside optimistic transactions
//! that commit atomically.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod aggregate;
pub mod catalog;
pub mod constraint;
pub mod database;
pub mod error;
pub mod model;
mod mutation;
pub mod storage;
pub mod view;

pub use aggregate::BookStats;
pub use catalog::{DeleteBehavior, DeletePolicy, EntityKind, LinkKind, Target, ViewKind};
pub use constraint::{CascadeResult, UniqueKey};
pub use database::Database;
pub use error::{ConstraintError, Error, ErrorKind, Result, TreeViolation};
pub use model::{
    Book, Club, Comment, Discussion, Entity, Fields, FriendRequest, FriendRequestStatus,
    Friendship, Id, Link, Opinion, ReadingStatus, Review, Row, RowKey, User, UserBookListing,
};
pub use storage::{Store, StoreConfig, Transaction};
pub use view::{ViewFilter, ViewRow};
