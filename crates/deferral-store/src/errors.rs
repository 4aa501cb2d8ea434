use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No snapshot is stored under the requested key.
    ///
    /// Readers of the deferral queue treat this as an empty snapshot.
    #[error("no snapshot stored under {0}")]
    NoSnapshot(String),
    /// I/O error while opening or preparing the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// SQLite backend error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Snapshot payload could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    /// A batch operation was used out of order (e.g. commit without begin).
    #[error("invalid batch state: {0}")]
    Batch(String),
    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Returns true if this is the recoverable missing-snapshot condition.
    pub fn is_no_snapshot(&self) -> bool {
        matches!(self, StoreError::NoSnapshot(_))
    }
}
