//! Cascade executor for purges.
//!
//! Purging a row walks every relation that points at its kind:
//! - CASCADE: purge the referencing rows, recursively
//! - SET NULL: clear the reference on the referencing rows
//!
//! Dependent rows are rewritten through the regular write path, so their
//! unique entries and aggregate contributions follow them.

use std::collections::HashSet;

use tracing::debug;

use crate::catalog::{relations_to, DeleteBehavior, EntityKind};
use crate::error::{Error, Result};
use crate::model::{Row, RowKey};
use crate::storage::Transaction;

/// Maximum cascade depth to prevent runaway recursion.
const MAX_CASCADE_DEPTH: usize = 100;

/// Rows touched by a cascade.
#[derive(Debug, Default)]
pub struct CascadeResult {
    /// Rows that were removed.
    pub deleted: Vec<(EntityKind, RowKey)>,
    /// References that were cleared: row and field.
    pub nullified: Vec<(EntityKind, RowKey, &'static str)>,
}

impl CascadeResult {
    /// Get the total number of affected rows.
    pub fn affected_count(&self) -> usize {
        self.deleted.len() + self.nullified.len()
    }
}

/// Applies delete behaviors to the dependents of a purged row.
#[derive(Debug, Default)]
pub struct CascadeExecutor {
    visited: HashSet<(EntityKind, RowKey)>,
    result: CascadeResult,
}

impl CascadeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Purge `row` and everything that cascades from it.
    pub(crate) fn purge(mut self, tx: &mut Transaction<'_>, row: Row) -> Result<CascadeResult> {
        let (kind, key) = (row.kind(), row.key());
        self.visited.insert((kind, key));
        self.process_dependents(tx, &row, 0)?;
        if let Some(latest) = tx.get(kind, key) {
            tx.write(Some(latest), None)?;
        }

        debug!(
            entity = %kind,
            key = %key,
            deleted = self.result.deleted.len(),
            nullified = self.result.nullified.len(),
            "purge cascaded"
        );
        Ok(self.result)
    }

    fn process_dependents(&mut self, tx: &mut Transaction<'_>, row: &Row, depth: usize) -> Result<()> {
        if depth > MAX_CASCADE_DEPTH {
            return Err(Error::validation(
                row.kind(),
                format!("cascade exceeded maximum depth {MAX_CASCADE_DEPTH}"),
            ));
        }

        // Only single-id rows are referenced.
        let Some(target) = row.key().id() else {
            return Ok(());
        };

        for relation in relations_to(row.kind()) {
            let field = relation.from_field;
            let referencing =
                tx.scan_where(relation.from_entity, |r| r.reference(field) == Some(target));

            for dependent in referencing {
                let slot = (dependent.kind(), dependent.key());
                // An earlier step may already have removed or rewritten it.
                let Some(current) = tx.get(slot.0, slot.1) else {
                    continue;
                };
                if current.reference(field) != Some(target) {
                    continue;
                }

                match relation.on_delete {
                    DeleteBehavior::Cascade => {
                        if !self.visited.insert(slot) {
                            continue;
                        }
                        self.process_dependents(tx, &current, depth + 1)?;
                        if let Some(latest) = tx.get(slot.0, slot.1) {
                            tx.write(Some(latest), None)?;
                            self.result.deleted.push(slot);
                        }
                    }
                    DeleteBehavior::SetNull => {
                        let mut cleared = current.clone();
                        if cleared.clear_reference(field) {
                            tx.write(Some(current), Some(cleared))?;
                            self.result.nullified.push((slot.0, slot.1, field));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
