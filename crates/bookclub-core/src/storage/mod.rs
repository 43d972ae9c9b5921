//! Storage layer for the book club store.
//!
//! Committed state lives in memory behind a read/write lock and is mirrored
//! into sled, which provides durability. Every commit writes its rows to
//! sled in one multi-tree transaction before the in-memory state moves.

mod config;
mod engine;
mod record;
mod state;
mod transaction;

pub mod key;

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

pub use config::{StoreConfig, DEFAULT_MAX_CONFLICT_RETRIES};
pub use engine::StorageEngine;
pub use record::Record;
pub use state::State;
pub use transaction::Transaction;

use state::WriteSet;

use crate::error::Result;
use crate::model::Id;

/// Committed state plus its durable mirror.
pub struct Store {
    state: RwLock<State>,
    engine: StorageEngine,
    next_id: AtomicU64,
    config: StoreConfig,
}

impl Store {
    /// Open the store, rebuilding derived data from the persisted rows.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let engine = StorageEngine::open(&config)?;
        let loaded = engine.load()?;

        let max_id = loaded
            .rows
            .iter()
            .filter_map(|(row, _)| row.key().id())
            .max()
            .unwrap_or(0);
        let next_id = loaded.next_id.max(max_id + 1);

        let state = State::from_rows(loaded.rows, loaded.seq);
        info!(seq = state.seq(), next_id, "store ready");

        Ok(Self {
            state: RwLock::new(state),
            engine,
            next_id: AtomicU64::new(next_id),
            config,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    /// Start a transaction.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Shared access to committed state.
    pub fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write()
    }

    /// Ids start at 1.
    pub(crate) fn allocate_id(&self) -> Id {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Write a validated write set to sled. Called with the state write lock held.
    pub(crate) fn persist(&self, writes: &WriteSet, seq: u64) -> Result<()> {
        let next_id = self.next_id.load(Ordering::SeqCst);
        self.engine.persist(writes, seq, next_id)?;
        if self.config.flush_every_ms.is_none() {
            self.engine.flush()?;
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.engine.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntityKind;
    use crate::error::Error;
    use crate::model::{Row, RowKey, User};

    fn user_row(store: &Store, name: &str) -> Row {
        let mut row: Row = User::new(name).into();
        row.assign_id(store.allocate_id());
        row
    }

    #[test]
    fn test_commit_visible_after() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let row = user_row(&store, "ann");
        let key = row.key();

        let mut tx = store.begin();
        tx.put_row(row);
        assert!(store.read().row(EntityKind::User, key).is_none());
        let seq = tx.commit().unwrap();

        assert_eq!(seq, 1);
        assert!(store.read().row(EntityKind::User, key).is_some());
    }

    #[test]
    fn test_rollback_discards() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let row = user_row(&store, "ann");
        let key = row.key();

        let mut tx = store.begin();
        tx.put_row(row);
        assert!(tx.get(EntityKind::User, key).is_some());
        tx.rollback();

        assert!(store.read().row(EntityKind::User, key).is_none());
    }

    #[test]
    fn test_stale_read_conflicts() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let row = user_row(&store, "ann");
        let key = row.key();

        let mut reader = store.begin();
        assert!(reader.get(EntityKind::User, key).is_none());

        let mut writer = store.begin();
        writer.put_row(row.clone());
        writer.commit().unwrap();

        assert!(reader.is_stale());
        reader.put_row(row);
        assert!(matches!(
            reader.commit(),
            Err(Error::TransactionConflict { .. })
        ));
    }

    #[test]
    fn test_removed_row_conflicts_reader() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let row = user_row(&store, "ann");
        let key = row.key();

        let mut tx = store.begin();
        tx.put_row(row);
        tx.commit().unwrap();

        let mut reader = store.begin();
        let seen = reader.get(EntityKind::User, key).unwrap();

        let mut writer = store.begin();
        writer.remove_row(EntityKind::User, key);
        writer.commit().unwrap();

        assert!(reader.is_stale());
        reader.put_row(seen);
        assert!(matches!(
            reader.commit(),
            Err(Error::TransactionConflict { .. })
        ));
    }

    #[test]
    fn test_scan_sees_overlay() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let ann = user_row(&store, "ann");
        let bob = user_row(&store, "bob");

        let mut tx = store.begin();
        tx.put_row(ann.clone());
        tx.commit().unwrap();

        let mut tx = store.begin();
        tx.put_row(bob);
        tx.remove_row(EntityKind::User, ann.key());
        let rows = tx.scan_where(EntityKind::User, |_| true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key(), RowKey::Id(2));
    }

    #[test]
    fn test_savepoint_restores_overlay() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let row = user_row(&store, "ann");
        let key = row.key();

        let mut tx = store.begin();
        let result: Result<()> = tx.atomically(|tx| {
            tx.put_row(row);
            Err(Error::validation(EntityKind::User, "rejected"))
        });
        assert!(result.is_err());
        assert_eq!(tx.pending_rows(), 0);
        assert!(tx.get(EntityKind::User, key).is_none());
    }

    #[test]
    fn test_next_id_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("db")).with_flush_every_ms(None);

        {
            let store = Store::open(config.clone()).unwrap();
            let row = user_row(&store, "ann");
            let mut tx = store.begin();
            tx.put_row(row);
            tx.commit().unwrap();
        }

        let store = Store::open(config).unwrap();
        assert_eq!(store.read().count(EntityKind::User), 1);
        assert_eq!(store.allocate_id(), 2);
    }
}
