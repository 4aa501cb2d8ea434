//! In-memory record store.

use crate::errors::StoreError;
use crate::record::{Notice, SnapshotData};
use crate::traits::RecordStore;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct Records {
    notices: Vec<Notice>,
    snapshots: BTreeMap<String, SnapshotData>,
}

/// Record store held entirely in memory.
///
/// Notices keep insertion order, so keys enumerate in the order their first
/// notice was saved. Batches are implemented by checkpointing the records on
/// [`begin`](RecordStore::begin) and restoring them on
/// [`rollback`](RecordStore::rollback).
///
/// # Example
///
/// ```rust
/// use deferral_store::{MemoryStore, Notice, RecordStore, SnapshotData};
///
/// let mut store = MemoryStore::new();
/// store.save_notice(&Notice::new("charm/on/start[1]", "charm", "on_start"))?;
/// store.save_snapshot("charm/on/start[1]", &SnapshotData::new())?;
///
/// assert_eq!(store.list_keys()?, vec!["charm/on/start[1]".to_string()]);
/// # Ok::<(), deferral_store::StoreError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Records,
    checkpoint: Option<Records>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored notice in insertion order.
    pub fn all_notices(&self) -> &[Notice] {
        &self.records.notices
    }

    /// Returns the keys of every stored snapshot, including orphaned ones.
    pub fn snapshot_keys(&self) -> Vec<String> {
        self.records.snapshots.keys().cloned().collect()
    }

    /// Returns true while a batch is open.
    pub fn in_batch(&self) -> bool {
        self.checkpoint.is_some()
    }
}

impl RecordStore for MemoryStore {
    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = Vec::new();
        for notice in &self.records.notices {
            if !keys.contains(&notice.key) {
                keys.push(notice.key.clone());
            }
        }
        Ok(keys)
    }

    fn notices(&self, key: &str) -> Result<Vec<Notice>, StoreError> {
        Ok(self
            .records
            .notices
            .iter()
            .filter(|n| n.key == key)
            .cloned()
            .collect())
    }

    fn load_snapshot(&self, key: &str) -> Result<SnapshotData, StoreError> {
        self.records
            .snapshots
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NoSnapshot(key.to_string()))
    }

    fn save_snapshot(&mut self, key: &str, data: &SnapshotData) -> Result<(), StoreError> {
        self.records
            .snapshots
            .insert(key.to_string(), data.clone());
        Ok(())
    }

    fn drop_snapshot(&mut self, key: &str) -> Result<(), StoreError> {
        self.records.snapshots.remove(key);
        Ok(())
    }

    fn save_notice(&mut self, notice: &Notice) -> Result<(), StoreError> {
        self.records.notices.push(notice.clone());
        Ok(())
    }

    fn drop_notice(&mut self, notice: &Notice) -> Result<(), StoreError> {
        self.records.notices.retain(|n| n != notice);
        Ok(())
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.checkpoint.is_some() {
            return Err(StoreError::Batch("batch already open".to_string()));
        }
        self.checkpoint = Some(self.records.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        match self.checkpoint.take() {
            Some(_) => Ok(()),
            None => Err(StoreError::Batch("commit without begin".to_string())),
        }
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        match self.checkpoint.take() {
            Some(records) => {
                self.records = records;
                Ok(())
            }
            None => Err(StoreError::Batch("rollback without begin".to_string())),
        }
    }
}
