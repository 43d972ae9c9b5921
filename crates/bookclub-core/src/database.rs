//! Transaction coordinator and the public store interface.

use tracing::{debug, warn};

use crate::aggregate::{self, BookStats};
use crate::catalog::{EntityKind, Target, ViewKind};
use crate::constraint::CascadeResult;
use crate::error::{Error, Result};
use crate::model::{Entity, Fields, Id, Row, RowKey};
use crate::storage::{Store, StoreConfig, Transaction};
use crate::view::{self, ViewFilter, ViewRow};

const VIEW_PERMISSION_ERROR: &str = "insufficient privileges (lack rights)";

/// The book club store.
///
/// Each operation runs as its own transaction through [`Database::transact`];
/// callers that need several operations to commit together use `transact`
/// directly.
pub struct Database {
    store: Store,
}

fn entity_target(target: impl Into<Target>) -> Result<EntityKind> {
    match target.into() {
        Target::Entity(kind) => Ok(kind),
        Target::View(view) => Err(Error::ReadOnlyViolation {
            view,
            reason: VIEW_PERMISSION_ERROR.to_string(),
        }),
    }
}

impl Database {
    /// Open or create a store.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Ok(Self {
            store: Store::open(config)?,
        })
    }

    /// Open a scratch store that is deleted on drop.
    pub fn temporary() -> Result<Self> {
        Self::open(StoreConfig::temporary())
    }

    pub fn config(&self) -> &StoreConfig {
        self.store.config()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Start a manual transaction. Nothing is retried; a commit that lost a
    /// race fails with [`Error::TransactionConflict`].
    pub fn begin(&self) -> Transaction<'_> {
        self.store.begin()
    }

    /// Run `work` in a transaction and commit it.
    ///
    /// If the commit finds that something `work` read was changed by a
    /// concurrent commit, `work` runs again on fresh state. An error from
    /// `work` itself is returned as is, unless its reads were already stale,
    /// in which case it also runs again: the failure may have been caused by
    /// the torn view.
    pub fn transact<T>(&self, mut work: impl FnMut(&mut Transaction<'_>) -> Result<T>) -> Result<T> {
        let max_retries = self.store.config().max_conflict_retries;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let mut tx = self.store.begin();

            let conflicted = match work(&mut tx) {
                Ok(value) => match tx.commit() {
                    Ok(_) => return Ok(value),
                    Err(Error::TransactionConflict { .. }) => true,
                    Err(e) => return Err(e),
                },
                Err(e) => {
                    if !tx.is_stale() {
                        return Err(e);
                    }
                    debug!(attempts, error = %e, "operation failed on stale reads");
                    tx.rollback();
                    true
                }
            };

            if conflicted {
                if attempts > max_retries {
                    warn!(attempts, "giving up after repeated conflicts");
                    return Err(Error::TransactionConflict { attempts });
                }
                debug!(attempts, "retrying after conflict");
            }
        }
    }

    /// Insert a typed row.
    pub fn create(&self, row: impl Into<Row>) -> Result<RowKey> {
        let row = row.into();
        self.transact(|tx| tx.create(row.clone()))
    }

    /// Insert a row given as a field map.
    pub fn create_fields(&self, target: impl Into<Target>, fields: Fields) -> Result<RowKey> {
        let kind = entity_target(target)?;
        let row = Row::from_fields(kind, fields)?;
        self.create(row)
    }

    /// Replace a typed row.
    pub fn update(&self, row: impl Into<Row>) -> Result<()> {
        let row = row.into();
        self.transact(|tx| tx.update(row.clone()))
    }

    /// Apply a partial field map to a row.
    pub fn update_fields(
        &self,
        target: impl Into<Target>,
        key: impl Into<RowKey>,
        fields: Fields,
    ) -> Result<()> {
        let kind = entity_target(target)?;
        let key = key.into();
        self.transact(|tx| tx.update_fields(kind, key, fields.clone()))
    }

    /// Delete a row according to its kind's delete policy.
    pub fn delete(&self, target: impl Into<Target>, key: impl Into<RowKey>) -> Result<()> {
        let kind = entity_target(target)?;
        let key = key.into();
        self.transact(|tx| tx.delete(kind, key))
    }

    /// Physically remove a row and cascade to its dependents.
    pub fn purge(
        &self,
        target: impl Into<Target>,
        key: impl Into<RowKey>,
    ) -> Result<CascadeResult> {
        let kind = entity_target(target)?;
        let key = key.into();
        self.transact(|tx| tx.purge(kind, key))
    }

    /// Read a committed row. Soft-deleted rows are returned too.
    pub fn get(&self, kind: EntityKind, key: impl Into<RowKey>) -> Result<Row> {
        let key = key.into();
        self.store
            .read()
            .row(kind, key)
            .cloned()
            .ok_or_else(|| Error::not_found(kind, key))
    }

    /// Read a committed row as its record type.
    pub fn get_as<E: Entity>(&self, key: impl Into<RowKey>) -> Result<E> {
        let key = key.into();
        self.get(E::KIND, key)
            .map(E::from_row)?
            .ok_or_else(|| Error::not_found(E::KIND, key))
    }

    /// All committed rows of a table, in key order.
    pub fn list(&self, kind: EntityKind) -> Vec<Row> {
        self.store.read().rows(kind).cloned().collect()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.store.read().count(kind)
    }

    /// Compute a view from a consistent snapshot of committed state.
    pub fn query(&self, view: ViewKind, filter: &ViewFilter, limit: Option<usize>) -> Vec<ViewRow> {
        let state = self.store.read();
        view::project(&state, view, filter, limit)
    }

    /// Statistics row of a book.
    pub fn book_statistics(&self, book_id: Id) -> Result<BookStats> {
        self.store
            .read()
            .stats(book_id)
            .copied()
            .ok_or_else(|| Error::not_found(EntityKind::Book, book_id))
    }

    /// Recompute derived data from the rows and report any disagreement.
    /// An empty list means indexes and aggregates are consistent.
    pub fn verify_aggregates(&self) -> Vec<String> {
        aggregate::verify(&self.store.read())
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::User;

    #[test]
    fn test_view_is_read_only() {
        let db = Database::temporary().unwrap();
        let err = db
            .create_fields(ViewKind::ClubPopularity, Fields::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReadOnlyViolation);
        assert!(err.to_string().contains("lack rights"));

        let err = db.delete(ViewKind::TopRatedBooks, 1u64).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReadOnlyViolation);
    }

    #[test]
    fn test_get_as() {
        let db = Database::temporary().unwrap();
        let key = db.create(User::new("ann")).unwrap();
        let user: User = db.get_as(key).unwrap();
        assert_eq!(user.username, "ann");
        assert!(db.get_as::<crate::model::Book>(key).is_err());
    }

    #[test]
    fn test_constraint_failure_not_retried() {
        let db = Database::temporary().unwrap();
        db.create(User::new("ann")).unwrap();

        let mut runs = 0;
        let err = db
            .transact(|tx| {
                runs += 1;
                tx.create(User::new("ann"))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UniqueViolation);
        assert_eq!(runs, 1);
    }
}
