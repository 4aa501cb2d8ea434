//! SQLite-backed record store.

use crate::errors::StoreError;
use crate::record::{Notice, SnapshotData};
use crate::traits::RecordStore;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS snapshot (
    handle TEXT PRIMARY KEY,
    data BLOB
);
CREATE TABLE IF NOT EXISTS notice (
    sequence INTEGER PRIMARY KEY AUTOINCREMENT,
    event_path TEXT,
    observer_path TEXT,
    method_name TEXT
);
";

/// Options for opening a SQLite store.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// Whether to create the database file if it doesn't exist (default: true).
    pub create: bool,
    /// Whether to use `synchronous = FULL` instead of `NORMAL` (default: false).
    pub sync: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            create: true,
            sync: false,
        }
    }
}

/// Record store backed by a SQLite database.
///
/// The layout matches the host framework's unit-state database:
/// - `snapshot(handle, data)`: one blob per key, JSON-encoded here
/// - `notice(sequence, event_path, observer_path, method_name)`: notices in
///   insertion order
///
/// A notice's `owner` is stored as `observer_path` and its `observer` as
/// `method_name`. Batches map to `BEGIN IMMEDIATE` / `COMMIT` / `ROLLBACK`.
///
/// # Example
///
/// ```rust
/// use deferral_store::{Notice, RecordStore, SqliteStore};
///
/// let mut store = SqliteStore::open_in_memory()?;
/// store.save_notice(&Notice::new("charm/on/start[1]", "charm", "on_start"))?;
/// assert_eq!(store.notices("charm/on/start[1]")?.len(), 1);
/// # Ok::<(), deferral_store::StoreError>(())
/// ```
pub struct SqliteStore {
    conn: Connection,
    in_batch: bool,
}

impl SqliteStore {
    /// Opens or creates a store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if:
    /// - the parent directory cannot be created
    /// - the file is missing and `options.create` is `false`
    /// - the schema cannot be initialized
    pub fn open<P: AsRef<Path>>(path: P, options: SqliteOptions) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE;
        if options.create {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }

        let conn = Connection::open_with_flags(path, flags)?;
        let store = Self::init(conn, &options)?;
        tracing::debug!(path = %path.display(), "opened sqlite record store");
        Ok(store)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, &SqliteOptions::default())
    }

    fn init(conn: Connection, options: &SqliteOptions) -> Result<Self, StoreError> {
        let sync_mode = if options.sync { "FULL" } else { "NORMAL" };
        conn.pragma_update(None, "synchronous", sync_mode)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn,
            in_batch: false,
        })
    }

    /// Returns the keys of every stored snapshot, including orphaned ones.
    pub fn snapshot_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT handle FROM snapshot ORDER BY handle")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let keys = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl RecordStore for SqliteStore {
    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT event_path FROM notice GROUP BY event_path ORDER BY MIN(sequence)",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let keys = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn notices(&self, key: &str) -> Result<Vec<Notice>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT event_path, observer_path, method_name FROM notice
             WHERE event_path = ?1 ORDER BY sequence",
        )?;
        let rows = stmt.query_map(params![key], |row| {
            Ok(Notice {
                key: row.get(0)?,
                owner: row.get(1)?,
                observer: row.get(2)?,
            })
        })?;
        let notices = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(notices)
    }

    fn load_snapshot(&self, key: &str) -> Result<SnapshotData, StoreError> {
        let blob: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT data FROM snapshot WHERE handle = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match blob {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Err(StoreError::NoSnapshot(key.to_string())),
        }
    }

    fn save_snapshot(&mut self, key: &str, data: &SnapshotData) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(data)?;
        self.conn.execute(
            "REPLACE INTO snapshot (handle, data) VALUES (?1, ?2)",
            params![key, bytes],
        )?;
        Ok(())
    }

    fn drop_snapshot(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM snapshot WHERE handle = ?1", params![key])?;
        Ok(())
    }

    fn save_notice(&mut self, notice: &Notice) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO notice (event_path, observer_path, method_name) VALUES (?1, ?2, ?3)",
            params![notice.key, notice.owner, notice.observer],
        )?;
        Ok(())
    }

    fn drop_notice(&mut self, notice: &Notice) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM notice
             WHERE event_path = ?1 AND observer_path = ?2 AND method_name = ?3",
            params![notice.key, notice.owner, notice.observer],
        )?;
        Ok(())
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.in_batch {
            return Err(StoreError::Batch("batch already open".to_string()));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.in_batch = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_batch {
            return Err(StoreError::Batch("commit without begin".to_string()));
        }
        self.conn.execute_batch("COMMIT")?;
        self.in_batch = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_batch {
            return Err(StoreError::Batch("rollback without begin".to_string()));
        }
        self.in_batch = false;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if self.in_batch {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}
