//! Comment reply forest.
//!
//! Reply links form a forest: every comment has at most one parent, and
//! following parents from any comment ends at a root.

use std::collections::HashSet;

use super::UniqueKey;
use crate::error::{ConstraintError, Error, Result, TreeViolation};
use crate::model::{Id, RowKey};
use crate::storage::Transaction;

fn violation(parent: Id, child: Id, reason: TreeViolation) -> Error {
    Error::ConstraintViolation(ConstraintError::TreeConstraintViolation {
        parent,
        child,
        reason,
    })
}

/// Parent of a comment, looked up through the child index.
pub(crate) fn parent_of(tx: &mut Transaction<'_>, comment: Id) -> Option<Id> {
    match tx.unique_owner(&UniqueKey::comment_parent(comment)) {
        Some(RowKey::Pair(parent, _)) => Some(parent),
        _ => None,
    }
}

/// Check that linking `parent -> child` keeps the forest shape.
pub(crate) fn check_comment_link(tx: &mut Transaction<'_>, parent: Id, child: Id) -> Result<()> {
    if parent == child {
        return Err(violation(parent, child, TreeViolation::SelfLink));
    }

    match parent_of(tx, child) {
        // Same link again: left to the primary key check.
        Some(existing) if existing == parent => return Ok(()),
        Some(_) => return Err(violation(parent, child, TreeViolation::MultipleParents)),
        None => {}
    }

    // Walk up from the proposed parent; meeting the child means a cycle.
    let mut seen = HashSet::new();
    let mut current = parent;
    while let Some(ancestor) = parent_of(tx, current) {
        if ancestor == child {
            return Err(violation(parent, child, TreeViolation::Cycle));
        }
        if !seen.insert(ancestor) {
            break;
        }
        current = ancestor;
    }
    Ok(())
}
