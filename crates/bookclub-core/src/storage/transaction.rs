//! Optimistic transactions over the committed state.
//!
//! A transaction stages every write in a local overlay and remembers the
//! version of each committed slot it looked at. Reads see the overlay first,
//! then committed state. Commit re-checks the recorded versions under the
//! store's write lock; if any moved, the transaction is stale and fails with
//! [`Error::TransactionConflict`] without writing anything.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::state::{Slot, State, WriteSet};
use super::Store;
use crate::aggregate::BookStats;
use crate::catalog::EntityKind;
use crate::constraint::UniqueKey;
use crate::error::{Error, Result};
use crate::model::{Id, Row, RowKey};

/// A unit of work against the store.
pub struct Transaction<'db> {
    store: &'db Store,
    writes: WriteSet,
    /// Committed slot versions observed by this transaction.
    reads: HashMap<Slot, u64>,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(store: &'db Store) -> Self {
        Self {
            store,
            writes: WriteSet::default(),
            reads: HashMap::new(),
        }
    }

    fn observe(&mut self, slot: Slot, state: &State) {
        let version = state.version(&slot);
        self.reads.entry(slot).or_insert(version);
    }

    /// Read a row, preferring this transaction's own writes.
    pub fn get(&mut self, kind: EntityKind, key: RowKey) -> Option<Row> {
        if let Some(staged) = self.writes.rows.get(&(kind, key)) {
            return staged.clone();
        }
        let store = self.store;
        let state = store.read();
        self.observe(Slot::Row(kind, key), &state);
        state.row(kind, key).cloned()
    }

    /// Rows of `kind` matching `pred`, in key order, overlay included.
    ///
    /// Records the table version, so a concurrent insert into or removal
    /// from the table makes this transaction stale.
    pub fn scan_where(&mut self, kind: EntityKind, pred: impl Fn(&Row) -> bool) -> Vec<Row> {
        let mut found: BTreeMap<RowKey, Row> = {
            let store = self.store;
            let state = store.read();
            self.observe(Slot::Table(kind), &state);
            state
                .rows(kind)
                .filter(|row| pred(row))
                .map(|row| (row.key(), row.clone()))
                .collect()
        };

        let staged = self
            .writes
            .rows
            .range((kind, RowKey::Id(0))..)
            .take_while(|((k, _), _)| *k == kind);
        for ((_, key), row) in staged {
            match row {
                Some(row) if pred(row) => {
                    found.insert(*key, row.clone());
                }
                _ => {
                    found.remove(key);
                }
            }
        }
        found.into_values().collect()
    }

    /// Stage a row insert or replacement.
    pub(crate) fn put_row(&mut self, row: Row) {
        self.writes.rows.insert((row.kind(), row.key()), Some(row));
    }

    /// Stage a row removal.
    pub(crate) fn remove_row(&mut self, kind: EntityKind, key: RowKey) {
        self.writes.rows.insert((kind, key), None);
    }

    /// Row currently holding a unique value.
    pub fn unique_owner(&mut self, key: &UniqueKey) -> Option<RowKey> {
        if let Some(staged) = self.writes.unique.get(key) {
            return *staged;
        }
        let store = self.store;
        let state = store.read();
        self.observe(Slot::Unique(key.clone()), &state);
        state.unique_owner(key)
    }

    pub(crate) fn set_unique(&mut self, key: UniqueKey, owner: Option<RowKey>) {
        self.writes.unique.insert(key, owner);
    }

    /// Statistics row of a book.
    pub fn stats(&mut self, book_id: Id) -> Option<BookStats> {
        if let Some(staged) = self.writes.stats.get(&book_id) {
            return *staged;
        }
        let store = self.store;
        let state = store.read();
        self.observe(Slot::Stats(book_id), &state);
        state.stats(book_id).copied()
    }

    pub(crate) fn put_stats(&mut self, book_id: Id, stats: Option<BookStats>) {
        self.writes.stats.insert(book_id, stats);
    }

    pub(crate) fn allocate_id(&self) -> Id {
        self.store.allocate_id()
    }

    /// Run `f`; if it fails, discard whatever it staged.
    pub(crate) fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let savepoint = self.writes.clone();
        let result = f(self);
        if result.is_err() {
            self.writes = savepoint;
        }
        result
    }

    /// Number of staged row writes.
    pub fn pending_rows(&self) -> usize {
        self.writes.rows.len()
    }

    fn stale_in(&self, state: &State) -> bool {
        self.reads
            .iter()
            .any(|(slot, version)| state.version(slot) != *version)
    }

    /// Whether a concurrent commit changed something this transaction read.
    pub fn is_stale(&self) -> bool {
        self.stale_in(&self.store.read())
    }

    /// Validate and commit. Returns the commit sequence number.
    pub fn commit(self) -> Result<u64> {
        let mut state = self.store.write();

        if self.stale_in(&state) {
            debug!(reads = self.reads.len(), "stale read set, aborting commit");
            return Err(Error::TransactionConflict { attempts: 1 });
        }

        if self.writes.is_empty() {
            return Ok(state.seq());
        }

        let seq = state.seq() + 1;
        self.store.persist(&self.writes, seq)?;

        debug!(
            seq,
            rows = self.writes.rows.len(),
            unique = self.writes.unique.len(),
            stats = self.writes.stats.len(),
            "commit"
        );
        state.apply(self.writes, seq);
        Ok(seq)
    }

    /// Discard the transaction.
    pub fn rollback(self) {
        debug!(rows = self.writes.rows.len(), "rollback");
    }
}
