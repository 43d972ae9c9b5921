//! Committed in-memory state and the write sets applied to it.

use std::collections::{BTreeMap, HashMap};

use crate::aggregate::{self, BookStats};
use crate::catalog::EntityKind;
use crate::constraint::{unique_entries, UniqueKey};
use crate::model::{Id, Row, RowKey};

/// A versioned location in the committed state.
///
/// Transactions record the version of every slot they observe; a commit is
/// rejected when any of them moved in the meantime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Row(EntityKind, RowKey),
    Unique(UniqueKey),
    Stats(Id),
    /// Set membership of a whole table, observed by scans.
    Table(EntityKind),
}

/// Staged changes of one transaction. `None` removes the entry.
#[derive(Debug, Clone, Default)]
pub(crate) struct WriteSet {
    pub rows: BTreeMap<(EntityKind, RowKey), Option<Row>>,
    pub unique: HashMap<UniqueKey, Option<RowKey>>,
    pub stats: BTreeMap<Id, Option<BookStats>>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.unique.is_empty() && self.stats.is_empty()
    }
}

/// Committed rows plus the indexes and aggregates derived from them.
#[derive(Debug, Default)]
pub struct State {
    tables: HashMap<EntityKind, BTreeMap<RowKey, Row>>,
    unique: HashMap<UniqueKey, RowKey>,
    stats: BTreeMap<Id, BookStats>,
    versions: HashMap<Slot, u64>,
    seq: u64,
}

impl State {
    /// Build state from persisted rows, deriving indexes and statistics.
    pub(crate) fn from_rows(rows: impl IntoIterator<Item = (Row, u64)>, seq: u64) -> Self {
        let mut state = State {
            seq,
            ..Default::default()
        };
        for (row, version) in rows {
            let kind = row.kind();
            let key = row.key();
            state.versions.insert(Slot::Row(kind, key), version);
            state.tables.entry(kind).or_default().insert(key, row);
        }
        state.unique = state.derive_unique();
        state.stats = aggregate::rebuild(&state);
        state
    }

    /// Unique index entries implied by the committed rows.
    pub(crate) fn derive_unique(&self) -> HashMap<UniqueKey, RowKey> {
        let mut unique = HashMap::new();
        for table in self.tables.values() {
            for row in table.values() {
                for key in unique_entries(row) {
                    unique.insert(key, row.key());
                }
            }
        }
        unique
    }

    /// Sequence number of the last commit.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn row(&self, kind: EntityKind, key: RowKey) -> Option<&Row> {
        self.tables.get(&kind)?.get(&key)
    }

    /// Rows of one table in key order.
    pub fn rows(&self, kind: EntityKind) -> impl Iterator<Item = &Row> + '_ {
        self.tables.get(&kind).into_iter().flat_map(|t| t.values())
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map_or(0, |t| t.len())
    }

    /// Row currently holding a unique value.
    pub fn unique_owner(&self, key: &UniqueKey) -> Option<RowKey> {
        self.unique.get(key).copied()
    }

    pub(crate) fn unique_index(&self) -> &HashMap<UniqueKey, RowKey> {
        &self.unique
    }

    pub fn stats(&self, book_id: Id) -> Option<&BookStats> {
        self.stats.get(&book_id)
    }

    /// All statistics rows in book id order.
    pub fn all_stats(&self) -> impl Iterator<Item = &BookStats> + '_ {
        self.stats.values()
    }

    pub(crate) fn version(&self, slot: &Slot) -> u64 {
        self.versions.get(slot).copied().unwrap_or(0)
    }

    /// Install a validated write set as commit `seq`.
    ///
    /// Absent slots read as version 0, so removing an entry drops its
    /// version too. A reader that saw the entry still loses: its recorded
    /// version was a nonzero commit number.
    pub(crate) fn apply(&mut self, writes: WriteSet, seq: u64) {
        for ((kind, key), row) in writes.rows {
            let table = self.tables.entry(kind).or_default();
            let slot = Slot::Row(kind, key);
            match row {
                Some(row) => {
                    table.insert(key, row);
                    self.versions.insert(slot, seq);
                }
                None => {
                    table.remove(&key);
                    self.versions.remove(&slot);
                }
            }
            self.versions.insert(Slot::Table(kind), seq);
        }

        for (key, owner) in writes.unique {
            match owner {
                Some(owner) => {
                    self.unique.insert(key.clone(), owner);
                    self.versions.insert(Slot::Unique(key), seq);
                }
                None => {
                    self.unique.remove(&key);
                    self.versions.remove(&Slot::Unique(key));
                }
            }
        }

        for (book_id, stats) in writes.stats {
            match stats {
                Some(stats) => {
                    self.stats.insert(book_id, stats);
                    self.versions.insert(Slot::Stats(book_id), seq);
                }
                None => {
                    self.stats.remove(&book_id);
                    self.versions.remove(&Slot::Stats(book_id));
                }
            }
        }

        self.seq = seq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Book, User};

    fn user(id: Id, name: &str) -> Row {
        let mut row: Row = User::new(name).into();
        row.assign_id(id);
        row
    }

    #[test]
    fn test_from_rows_derives_indexes() {
        let mut book: Row = Book::new("dune", "Dune").into();
        book.assign_id(2);
        let state = State::from_rows(vec![(user(1, "ann"), 3), (book, 4)], 4);

        assert_eq!(state.count(EntityKind::User), 1);
        assert_eq!(
            state.unique_owner(&UniqueKey::new("users_username_unique", ["ann"])),
            Some(RowKey::Id(1))
        );
        assert_eq!(state.stats(2), Some(&BookStats::new(2)));
        assert_eq!(state.version(&Slot::Row(EntityKind::User, RowKey::Id(1))), 3);
    }

    #[test]
    fn test_apply_bumps_versions() {
        let mut state = State::default();
        let mut writes = WriteSet::default();
        writes
            .rows
            .insert((EntityKind::User, RowKey::Id(1)), Some(user(1, "ann")));
        state.apply(writes, 7);

        assert_eq!(state.seq(), 7);
        assert_eq!(state.version(&Slot::Table(EntityKind::User)), 7);
        assert_eq!(state.version(&Slot::Table(EntityKind::Book)), 0);

        let mut writes = WriteSet::default();
        writes.rows.insert((EntityKind::User, RowKey::Id(1)), None);
        state.apply(writes, 8);
        assert!(state.row(EntityKind::User, RowKey::Id(1)).is_none());
        assert_eq!(state.version(&Slot::Row(EntityKind::User, RowKey::Id(1))), 0);
        assert_eq!(state.version(&Slot::Table(EntityKind::User)), 8);
    }

    #[test]
    fn test_removed_entries_drop_versions() {
        let mut state = State::default();
        let name = UniqueKey::new("users_username_unique", ["ann"]);
        for round in 0..50u64 {
            let key = RowKey::Id(round + 1);
            let mut writes = WriteSet::default();
            writes
                .rows
                .insert((EntityKind::User, key), Some(user(round + 1, "ann")));
            writes.unique.insert(name.clone(), Some(key));
            state.apply(writes, 2 * round + 1);

            let mut writes = WriteSet::default();
            writes.rows.insert((EntityKind::User, key), None);
            writes.unique.insert(name.clone(), None);
            state.apply(writes, 2 * round + 2);
        }

        // Only the table membership slot is left.
        assert_eq!(state.versions.len(), 1);
        assert_eq!(state.version(&Slot::Unique(name)), 0);
        assert_eq!(state.count(EntityKind::User), 0);
    }
}
