//! Row mutations inside a transaction.
//!
//! Every public operation is all-or-nothing within its transaction: when it
//! fails, whatever it staged (including cascades and hook writes) is
//! discarded and the transaction can keep going.

use crate::aggregate;
use crate::catalog::{DeletePolicy, EntityKind, LinkKind};
use crate::constraint::{self, tree, validator, CascadeExecutor, CascadeResult};
use crate::error::{ConstraintError, Error, Result};
use crate::model::{Fields, Row, RowKey};
use crate::storage::Transaction;

impl Transaction<'_> {
    /// Stage one row change: `before` is the current row, `after` its
    /// replacement, `None` on either side meaning insert or removal.
    ///
    /// Runs validation, reference checks and unique claims, then the
    /// aggregate hooks. Cascades are not followed here.
    pub(crate) fn write(&mut self, before: Option<Row>, mut after: Option<Row>) -> Result<()> {
        if let Some(row) = after.as_mut() {
            validator::validate_fields(before.as_ref(), row)?;
            aggregate::derive_fields(self, row);

            if let (None, Row::Link(link)) = (&before, &*row) {
                if link.kind == LinkKind::CommentComment {
                    tree::check_comment_link(self, link.left, link.right)?;
                }
            }

            validator::check_references(self, before.as_ref(), row)?;
        }

        if let Some(row) = &before {
            constraint::release(self, row);
        }
        if let Some(row) = &after {
            constraint::claim(self, row)?;
        }

        match (&before, &after) {
            (_, Some(row)) => self.put_row(row.clone()),
            (Some(row), None) => self.remove_row(row.kind(), row.key()),
            (None, None) => {}
        }

        aggregate::after_write(self, before.as_ref(), after.as_ref())
    }

    fn existing(&mut self, kind: EntityKind, key: RowKey) -> Result<Row> {
        self.get(kind, key)
            .ok_or_else(|| Error::not_found(kind, key))
    }

    /// Insert a row. Single-id rows get a fresh id; the key is returned.
    pub fn create(&mut self, row: impl Into<Row>) -> Result<RowKey> {
        let mut row = row.into();
        let kind = row.kind();
        if kind == EntityKind::Friendship {
            return Err(Error::validation(
                kind,
                "friendships are created by confirming a friend request",
            ));
        }

        self.atomically(|tx| {
            if kind.has_id_key() {
                row.assign_id(tx.allocate_id());
            } else if tx.get(kind, row.key()).is_some() {
                return Err(Error::ConstraintViolation(ConstraintError::UniqueViolation {
                    constraint: format!("{kind}_pkey"),
                    entity: kind,
                    value: row.key().to_string(),
                }));
            }
            let key = row.key();
            tx.write(None, Some(row))?;
            Ok(key)
        })
    }

    /// Insert a row given as a field map.
    pub fn create_fields(&mut self, kind: EntityKind, fields: Fields) -> Result<RowKey> {
        self.create(Row::from_fields(kind, fields)?)
    }

    /// Replace an existing row, located by its key.
    pub fn update(&mut self, row: impl Into<Row>) -> Result<()> {
        let row = row.into();
        self.atomically(|tx| {
            let before = tx.existing(row.kind(), row.key())?;
            tx.write(Some(before), Some(row))
        })
    }

    /// Apply a partial field map to an existing row.
    pub fn update_fields(&mut self, kind: EntityKind, key: RowKey, fields: Fields) -> Result<()> {
        self.atomically(|tx| {
            let before = tx.existing(kind, key)?;
            let after = before.merged(fields)?;
            tx.write(Some(before), Some(after))
        })
    }

    /// Delete a row according to its kind's policy: soft-deletable kinds get
    /// their flag set, everything else is purged.
    pub fn delete(&mut self, kind: EntityKind, key: RowKey) -> Result<()> {
        match kind.delete_policy() {
            DeletePolicy::Soft => self.atomically(|tx| {
                let before = tx.existing(kind, key)?;
                if before.is_deleted() {
                    return Ok(());
                }
                let mut after = before.clone();
                after.set_deleted(true);
                tx.write(Some(before), Some(after))
            }),
            DeletePolicy::Hard => self.purge(kind, key).map(|_| ()),
        }
    }

    /// Physically remove a row and apply the cascade rules to its dependents.
    pub fn purge(&mut self, kind: EntityKind, key: RowKey) -> Result<CascadeResult> {
        self.atomically(|tx| {
            let row = tx.existing(kind, key)?;
            CascadeExecutor::new().purge(tx, row)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::model::{Link, RowKey, User};
    use crate::storage::{Store, StoreConfig};

    use super::*;

    #[test]
    fn test_failed_operation_keeps_transaction_usable() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let mut tx = store.begin();

        let ann = tx.create(User::new("ann")).unwrap();
        let err = tx.create(User::new("ann")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UniqueViolation);

        let err = tx.create(Link::club_user(99, ann.id().unwrap())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialViolation);

        assert_eq!(tx.pending_rows(), 1);
        tx.commit().unwrap();
        assert_eq!(store.read().count(EntityKind::User), 1);
    }

    #[test]
    fn test_update_missing_row() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let mut tx = store.begin();
        let err = tx
            .update_fields(EntityKind::User, RowKey::Id(42), Fields::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_soft_delete_is_idempotent() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let mut tx = store.begin();
        let ann = tx.create(User::new("ann")).unwrap();
        tx.delete(EntityKind::User, ann).unwrap();
        tx.delete(EntityKind::User, ann).unwrap();
        assert!(tx.get(EntityKind::User, ann).unwrap().is_deleted());
    }
}
