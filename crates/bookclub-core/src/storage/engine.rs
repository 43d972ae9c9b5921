//! sled substrate holding the durable copy of every row.

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use tracing::info;

use super::state::WriteSet;
use super::{key, Record, StoreConfig};
use crate::error::Error;
use crate::model::Row;

/// Tree name for row data.
const ROWS_TREE: &str = "rows";

/// Tree name for metadata (commit sequence, id allocator).
const META_TREE: &str = "meta";

const SEQ_KEY: &[u8] = b"seq";
const NEXT_ID_KEY: &[u8] = b"next_id";

/// Everything read back from disk on open.
#[derive(Debug, Default)]
pub(crate) struct Loaded {
    /// Rows with the commit sequence that last wrote them.
    pub rows: Vec<(Row, u64)>,
    pub seq: u64,
    pub next_id: u64,
}

/// The storage engine wrapping sled.
pub struct StorageEngine {
    db: Db,
    rows_tree: Tree,
    meta_tree: Tree,
}

fn read_u64(bytes: &[u8]) -> Result<u64, Error> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| Error::Deserialization(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}

impl StorageEngine {
    /// Open or create the engine with the given configuration.
    pub fn open(config: &StoreConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let rows_tree = db.open_tree(ROWS_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;

        info!(
            path = %config.path.display(),
            temporary = config.temporary,
            recovered = db.was_recovered(),
            "storage opened"
        );

        Ok(Self {
            db,
            rows_tree,
            meta_tree,
        })
    }

    /// Check if the database was recovered from a previous run.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Read every persisted row and the metadata counters.
    pub(crate) fn load(&self) -> Result<Loaded, Error> {
        let mut loaded = Loaded::default();

        for entry in self.rows_tree.iter() {
            let (key_bytes, value_bytes) = entry?;
            let (kind, row_key) = key::decode(&key_bytes)
                .ok_or_else(|| Error::Deserialization("malformed row key".to_string()))?;
            let record = Record::from_bytes(&value_bytes)?;
            let row = Row::from_payload(kind, &record.payload)?;
            if row.key() != row_key {
                return Err(Error::Deserialization(format!(
                    "{kind} row stored under {row_key} carries key {}",
                    row.key()
                )));
            }
            loaded.rows.push((row, record.version));
        }

        if let Some(bytes) = self.meta_tree.get(SEQ_KEY)? {
            loaded.seq = read_u64(&bytes)?;
        }
        if let Some(bytes) = self.meta_tree.get(NEXT_ID_KEY)? {
            loaded.next_id = read_u64(&bytes)?;
        }

        info!(rows = loaded.rows.len(), seq = loaded.seq, "rows loaded");
        Ok(loaded)
    }

    /// Persist a write set as one multi-tree sled transaction.
    pub(crate) fn persist(&self, writes: &WriteSet, seq: u64, next_id: u64) -> Result<(), Error> {
        let mut ops = Vec::with_capacity(writes.rows.len());
        for ((kind, row_key), row) in &writes.rows {
            let value = match row {
                Some(row) => Some(Record::new(row.to_payload()?, seq).to_bytes()?),
                None => None,
            };
            ops.push((key::encode(*kind, *row_key), value));
        }

        let result: Result<(), TransactionError<Error>> = (&self.rows_tree, &self.meta_tree)
            .transaction(|(rows_tx, meta_tx)| {
                for (key, value) in &ops {
                    match value {
                        Some(value) => {
                            rows_tx.insert(key.as_slice(), value.as_slice())?;
                        }
                        None => {
                            rows_tx.remove(key.as_slice())?;
                        }
                    }
                }
                meta_tx.insert(SEQ_KEY, &seq.to_be_bytes()[..])?;
                meta_tx.insert(NEXT_ID_KEY, &next_id.to_be_bytes()[..])?;
                Ok::<(), ConflictableTransactionError<Error>>(())
            });

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(Error::Storage(e)),
        }
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Get the size of the database on disk in bytes.
    pub fn size_on_disk(&self) -> Result<u64, Error> {
        Ok(self.db.size_on_disk()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntityKind;
    use crate::model::{RowKey, User};

    #[test]
    fn test_persist_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("db"));

        {
            let engine = StorageEngine::open(&config).unwrap();
            let mut row: Row = User::new("ann").into();
            row.assign_id(5);

            let mut writes = WriteSet::default();
            writes.rows.insert((EntityKind::User, RowKey::Id(5)), Some(row));
            engine.persist(&writes, 1, 6).unwrap();
            engine.flush().unwrap();
        }

        let engine = StorageEngine::open(&config).unwrap();
        let loaded = engine.load().unwrap();
        assert_eq!(loaded.seq, 1);
        assert_eq!(loaded.next_id, 6);
        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.rows[0].0.key(), RowKey::Id(5));
        assert_eq!(loaded.rows[0].1, 1);
    }

    #[test]
    fn test_persist_removal() {
        let engine = StorageEngine::open(&StoreConfig::temporary()).unwrap();
        let row: Row = crate::model::UserBookListing::new(1, 2).into();

        let mut writes = WriteSet::default();
        writes.rows.insert((row.kind(), row.key()), Some(row.clone()));
        engine.persist(&writes, 1, 1).unwrap();

        let mut writes = WriteSet::default();
        writes.rows.insert((row.kind(), row.key()), None);
        engine.persist(&writes, 2, 1).unwrap();

        let loaded = engine.load().unwrap();
        assert!(loaded.rows.is_empty());
        assert_eq!(loaded.seq, 2);
    }
}
