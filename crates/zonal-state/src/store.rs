//! ZoneStore — redb-backed persistence for zone records and subzone tables.
//!
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use zonal_core::{DescriptorId, IndexId, Subzone, SubzoneTable, ZoneRecord, ZoneSnapshot};

use crate::error::{StateError, StateResult};
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

fn encode<T: Serialize>(value: &T) -> StateResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(map_err!(Serialize))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StateResult<T> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}

fn load_one<T, R>(table: &T, id: DescriptorId) -> StateResult<Option<R>>
where
    T: ReadableTable<u32, &'static [u8]>,
    R: DeserializeOwned,
{
    match table.get(id).map_err(map_err!(Read))? {
        Some(guard) => Ok(Some(decode(guard.value())?)),
        None => Ok(None),
    }
}

fn load_all<T, R>(table: &T) -> StateResult<BTreeMap<DescriptorId, R>>
where
    T: ReadableTable<u32, &'static [u8]>,
    R: DeserializeOwned,
{
    let mut out = BTreeMap::new();
    for entry in table.iter().map_err(map_err!(Read))? {
        let (key, value) = entry.map_err(map_err!(Read))?;
        out.insert(key.value(), decode(value.value())?);
    }
    Ok(out)
}

/// Thread-safe zone store backed by redb.
#[derive(Clone)]
pub struct ZoneStore {
    db: Arc<Database>,
}

impl ZoneStore {
    /// Open (or create) a persistent zone store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "zone store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory zone store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory zone store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(ZONES).map_err(map_err!(Table))?;
        txn.open_table(SUBZONES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// Every zone record and subzone table, read in one transaction.
    pub fn snapshot(&self) -> StateResult<ZoneSnapshot> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let zones = txn.open_table(ZONES).map_err(map_err!(Table))?;
        let subzones = txn.open_table(SUBZONES).map_err(map_err!(Table))?;
        Ok(ZoneSnapshot {
            zones: load_all(&zones)?,
            subzones: load_all(&subzones)?,
        })
    }

    pub fn get_zone(&self, id: DescriptorId) -> StateResult<Option<ZoneRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ZONES).map_err(map_err!(Table))?;
        load_one(&table, id)
    }

    /// The subzone table of a table; empty when it has none.
    pub fn get_subzones(&self, table_id: DescriptorId) -> StateResult<SubzoneTable> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SUBZONES).map_err(map_err!(Table))?;
        Ok(load_one(&table, table_id)?.unwrap_or_else(|| SubzoneTable::new(table_id)))
    }

    // ── Single-record writes ───────────────────────────────────────

    pub fn put_zone(&self, id: DescriptorId, record: &ZoneRecord) -> StateResult<()> {
        self.write(|txn| txn.set_zone(id, record))
    }

    /// Delete a zone record. Returns true if it existed.
    pub fn delete_zone(&self, id: DescriptorId) -> StateResult<bool> {
        self.write(|txn| txn.delete_zone(id))
    }

    pub fn put_subzones(&self, subzones: &SubzoneTable) -> StateResult<()> {
        self.write(|txn| txn.put_subzones(subzones))
    }

    // ── Transactions ───────────────────────────────────────────────

    /// Run `f` inside one write transaction. Commits when `f` returns `Ok`;
    /// aborts and leaves the store untouched otherwise.
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut ZoneWriteTxn) -> Result<T, E>,
        E: From<StateError>,
    {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let mut wtxn = ZoneWriteTxn { txn };
        match f(&mut wtxn) {
            Ok(value) => {
                wtxn.txn.commit().map_err(map_err!(Transaction))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort) = wtxn.txn.abort() {
                    warn!(error = %abort, "failed to abort zone store transaction");
                }
                Err(err)
            }
        }
    }
}

/// An open write transaction over the zone store.
///
/// Reads observe the transaction's own uncommitted writes.
pub struct ZoneWriteTxn {
    txn: WriteTransaction,
}

impl ZoneWriteTxn {
    pub fn zone(&self, id: DescriptorId) -> StateResult<Option<ZoneRecord>> {
        let table = self.txn.open_table(ZONES).map_err(map_err!(Table))?;
        load_one(&table, id)
    }

    pub fn set_zone(&mut self, id: DescriptorId, record: &ZoneRecord) -> StateResult<()> {
        let value = encode(record)?;
        {
            let mut table = self.txn.open_table(ZONES).map_err(map_err!(Table))?;
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        debug!(id, "zone record stored");
        Ok(())
    }

    /// Delete a zone record. Returns true if it existed.
    pub fn delete_zone(&mut self, id: DescriptorId) -> StateResult<bool> {
        let existed;
        {
            let mut table = self.txn.open_table(ZONES).map_err(map_err!(Table))?;
            existed = table.remove(id).map_err(map_err!(Write))?.is_some();
        }
        debug!(id, existed, "zone record deleted");
        Ok(existed)
    }

    /// The subzone table of a table; empty when it has none.
    pub fn subzones(&self, table_id: DescriptorId) -> StateResult<SubzoneTable> {
        let table = self.txn.open_table(SUBZONES).map_err(map_err!(Table))?;
        Ok(load_one(&table, table_id)?.unwrap_or_else(|| SubzoneTable::new(table_id)))
    }

    /// Store a whole subzone table. An empty one removes the row.
    pub fn put_subzones(&mut self, subzones: &SubzoneTable) -> StateResult<()> {
        let mut table = self.txn.open_table(SUBZONES).map_err(map_err!(Table))?;
        if subzones.is_empty() {
            table
                .remove(subzones.table_id)
                .map_err(map_err!(Write))?;
        } else {
            let value = encode(subzones)?;
            table
                .insert(subzones.table_id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        Ok(())
    }

    /// Insert or replace one subzone. Returns its position in the table.
    pub fn set_subzone(&mut self, table_id: DescriptorId, subzone: Subzone) -> StateResult<usize> {
        let mut subzones = self.subzones(table_id)?;
        let index_id = subzone.index_id;
        let pos = subzones.set(subzone);
        self.put_subzones(&subzones)?;
        debug!(table_id, index_id, pos, "subzone stored");
        Ok(pos)
    }

    /// Delete one subzone. Returns true if it existed.
    pub fn delete_subzone(
        &mut self,
        table_id: DescriptorId,
        index_id: IndexId,
        partition: &str,
    ) -> StateResult<bool> {
        let mut subzones = self.subzones(table_id)?;
        let existed = subzones.remove(index_id, partition).is_some();
        if existed {
            self.put_subzones(&subzones)?;
        }
        debug!(table_id, index_id, partition, existed, "subzone deleted");
        Ok(existed)
    }

    /// Delete every subzone of an index. Returns how many were removed.
    pub fn delete_index_subzones(
        &mut self,
        table_id: DescriptorId,
        index_id: IndexId,
    ) -> StateResult<usize> {
        let mut subzones = self.subzones(table_id)?;
        let removed = subzones.remove_index(index_id);
        if removed > 0 {
            self.put_subzones(&subzones)?;
        }
        debug!(table_id, index_id, removed, "index subzones deleted");
        Ok(removed)
    }

    /// Every record as seen by this transaction.
    pub fn snapshot(&self) -> StateResult<ZoneSnapshot> {
        let zones = self.txn.open_table(ZONES).map_err(map_err!(Table))?;
        let subzones = self.txn.open_table(SUBZONES).map_err(map_err!(Table))?;
        Ok(ZoneSnapshot {
            zones: load_all(&zones)?,
            subzones: load_all(&subzones)?,
        })
    }
}
