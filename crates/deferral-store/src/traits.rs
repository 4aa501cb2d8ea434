//! Record store port consumed by the deferral queue.

use crate::errors::StoreError;
use crate::record::{Notice, SnapshotData};

/// Key/value persistence for notices and snapshots.
///
/// Implementations hold two keyed record sets:
/// - notices: ordered `(key, owner, observer)` triples
/// - snapshots: one JSON map per key
///
/// Enumeration order must be stable for a given store between a read and a
/// subsequent write. Backends that preserve insertion order let callers
/// reorder the queue by rewriting it.
///
/// The batch methods (`begin`, `commit`, `rollback`) default to no-ops. A
/// backend that overrides them makes replace-writes all-or-nothing.
pub trait RecordStore {
    /// Lists every key that currently has at least one notice, in order of
    /// its first notice.
    fn list_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Lists the notices stored under `key`, in insertion order.
    fn notices(&self, key: &str) -> Result<Vec<Notice>, StoreError>;

    /// Loads the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoSnapshot`] if nothing is stored under `key`.
    fn load_snapshot(&self, key: &str) -> Result<SnapshotData, StoreError>;

    /// Saves (or overwrites) the snapshot stored under `key`.
    fn save_snapshot(&mut self, key: &str, data: &SnapshotData) -> Result<(), StoreError>;

    /// Removes the snapshot stored under `key`. Missing keys are ignored.
    fn drop_snapshot(&mut self, key: &str) -> Result<(), StoreError>;

    /// Appends a notice.
    fn save_notice(&mut self, notice: &Notice) -> Result<(), StoreError>;

    /// Removes every notice equal to `notice`.
    fn drop_notice(&mut self, notice: &Notice) -> Result<(), StoreError>;

    /// Starts a batch of writes.
    fn begin(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Makes the writes since [`begin`](RecordStore::begin) durable.
    fn commit(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Discards the writes since [`begin`](RecordStore::begin).
    fn rollback(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &mut S {
    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_keys()
    }

    fn notices(&self, key: &str) -> Result<Vec<Notice>, StoreError> {
        (**self).notices(key)
    }

    fn load_snapshot(&self, key: &str) -> Result<SnapshotData, StoreError> {
        (**self).load_snapshot(key)
    }

    fn save_snapshot(&mut self, key: &str, data: &SnapshotData) -> Result<(), StoreError> {
        (**self).save_snapshot(key, data)
    }

    fn drop_snapshot(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).drop_snapshot(key)
    }

    fn save_notice(&mut self, notice: &Notice) -> Result<(), StoreError> {
        (**self).save_notice(notice)
    }

    fn drop_notice(&mut self, notice: &Notice) -> Result<(), StoreError> {
        (**self).drop_notice(notice)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        (**self).rollback()
    }
}
