//! Core error types.

use thiserror::Error;

use crate::catalog::{EntityKind, ViewKind};
use crate::model::{Id, RowKey};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Core store errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A uniqueness, reference or tree constraint rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(#[from] ConstraintError),

    /// A write was attempted against a projected view.
    #[error("view `{view}` is read-only: {reason}")]
    ReadOnlyViolation {
        /// View that was targeted.
        view: ViewKind,
        /// Underlying permission error.
        reason: String,
    },

    /// Operation on an absent row.
    #[error("{entity} {key} not found")]
    NotFound {
        /// Entity kind that was looked up.
        entity: EntityKind,
        /// Key that was looked up.
        key: RowKey,
    },

    /// Field values failed validation (bad enum value, out-of-range number, ...).
    #[error("invalid {entity}: {message}")]
    Validation {
        /// Entity kind being written.
        entity: EntityKind,
        /// What was wrong.
        message: String,
    },

    /// The transaction read data that a concurrent commit changed.
    #[error("transaction conflict after {attempts} attempt(s)")]
    TransactionConflict {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Storage substrate error (I/O, corruption).
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    /// Duplicate value for a unique key.
    #[error("duplicate value `{value}` for unique constraint `{constraint}` on {entity}")]
    UniqueViolation {
        /// Constraint name.
        constraint: String,
        /// Entity kind.
        entity: EntityKind,
        /// Offending value.
        value: String,
    },

    /// Missing or soft-deleted mandatory reference.
    #[error("{entity}.{field} references missing or deleted {referenced} {id}")]
    ReferentialViolation {
        /// Entity whose field holds the reference.
        entity: EntityKind,
        /// Reference field.
        field: String,
        /// Referenced entity kind.
        referenced: EntityKind,
        /// Referenced id.
        id: Id,
    },

    /// Comment link would break the forest shape.
    #[error("comment link {parent} -> {child} rejected: {reason}")]
    TreeConstraintViolation {
        /// Proposed parent comment.
        parent: Id,
        /// Proposed child comment.
        child: Id,
        /// Why the link was rejected.
        reason: TreeViolation,
    },
}

/// Reason a comment link was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeViolation {
    /// Parent and child are the same comment.
    SelfLink,
    /// The child already has a different parent.
    MultipleParents,
    /// The parent is already a descendant of the child.
    Cycle,
}

impl std::fmt::Display for TreeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeViolation::SelfLink => write!(f, "a comment cannot be its own parent"),
            TreeViolation::MultipleParents => write!(f, "child already has a parent"),
            TreeViolation::Cycle => write!(f, "parent is a descendant of child"),
        }
    }
}

/// Flat error category for callers that only branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UniqueViolation,
    ReferentialViolation,
    TreeConstraintViolation,
    ReadOnlyViolation,
    NotFound,
    Validation,
    Conflict,
    Transport,
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConstraintViolation(ConstraintError::UniqueViolation { .. }) => {
                ErrorKind::UniqueViolation
            }
            Error::ConstraintViolation(ConstraintError::ReferentialViolation { .. }) => {
                ErrorKind::ReferentialViolation
            }
            Error::ConstraintViolation(ConstraintError::TreeConstraintViolation { .. }) => {
                ErrorKind::TreeConstraintViolation
            }
            Error::ReadOnlyViolation { .. } => ErrorKind::ReadOnlyViolation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::TransactionConflict { .. } => ErrorKind::Conflict,
            Error::Storage(_) | Error::Serialization(_) | Error::Deserialization(_) => {
                ErrorKind::Transport
            }
        }
    }

    pub(crate) fn validation(entity: EntityKind, message: impl Into<String>) -> Self {
        Error::Validation {
            entity,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: EntityKind, key: impl Into<RowKey>) -> Self {
        Error::NotFound {
            entity,
            key: key.into(),
        }
    }
}
