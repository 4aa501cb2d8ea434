//! Translation between store records and ordered queue entries.

use crate::entry::QueueEntry;
use crate::error::QueueError;
use crate::filter::{EventKeyFilter, KeyFilter};
use deferral_store::{RecordStore, StoreError};

/// How [`QueueCodec::write`] treats records already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Clear every queue notice first, then write the given entries.
    #[default]
    Replace,
    /// Write the given entries after whatever is already queued.
    Append,
}

/// Options for queue writing.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Replace or append (default: replace).
    pub mode: WriteMode,
    /// Whether a replace also deletes the snapshots of cleared keys
    /// (default: false, cleared snapshots are left orphaned).
    pub prune_snapshots: bool,
}

impl WriteOptions {
    /// Options for an additive write.
    pub fn append() -> Self {
        Self {
            mode: WriteMode::Append,
            ..Self::default()
        }
    }
}

/// Counts reported by a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteSummary {
    /// Notices dropped while clearing the previous queue.
    pub cleared: usize,
    /// Entries written.
    pub written: usize,
}

/// Reads and writes the deferral queue held in a [`RecordStore`].
///
/// Only keys accepted by the codec's [`KeyFilter`] are treated as queue
/// entries; everything else in the store is left alone.
///
/// # Example
///
/// ```rust
/// use deferral_queue::{QueueCodec, QueueEntry, WriteOptions};
/// use deferral_store::MemoryStore;
///
/// let codec = QueueCodec::new();
/// let mut store = MemoryStore::new();
///
/// let entries = vec![
///     QueueEntry::for_observer("start", "charm", "on_start", 1)?,
///     QueueEntry::for_observer("stop", "charm", "on_stop", 1)?,
/// ];
/// codec.write(&mut store, &entries, &WriteOptions::default())?;
///
/// assert_eq!(codec.read(&store)?, entries);
/// # Ok::<(), deferral_queue::QueueError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueueCodec<F: KeyFilter = EventKeyFilter> {
    filter: F,
}

impl QueueCodec {
    /// Creates a codec using [`EventKeyFilter`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: KeyFilter> QueueCodec<F> {
    /// Creates a codec using a custom key filter.
    pub fn with_filter(filter: F) -> Self {
        Self { filter }
    }

    /// Returns the key filter.
    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// Loads every queued entry, in store enumeration order.
    ///
    /// A notice without a snapshot yields an entry with an empty snapshot.
    ///
    /// # Errors
    ///
    /// Any store error other than a missing snapshot is returned unchanged
    /// as [`QueueError::Store`].
    pub fn read<S: RecordStore + ?Sized>(&self, store: &S) -> Result<Vec<QueueEntry>, QueueError> {
        let mut entries = Vec::new();

        for key in self.queue_keys(store)? {
            for notice in store.notices(&key)? {
                let snapshot_data = match store.load_snapshot(&notice.key) {
                    Ok(data) => data,
                    Err(StoreError::NoSnapshot(_)) => {
                        tracing::debug!(key = %notice.key, "notice has no snapshot");
                        Default::default()
                    }
                    Err(e) => return Err(e.into()),
                };
                entries.push(QueueEntry::from_notice(notice, snapshot_data));
            }
        }

        tracing::debug!(entries = entries.len(), "read deferral queue");
        Ok(entries)
    }

    /// Persists `entries` in order.
    ///
    /// With [`WriteMode::Replace`] every notice under a queue key is dropped
    /// first, so a following [`read`](Self::read) returns exactly `entries`
    /// (given unique handle paths and an order-preserving store). Each entry
    /// writes its notice, then its snapshot keyed by handle path.
    ///
    /// The writes run inside the store's batch hooks. When a step fails the
    /// batch is rolled back before the error is returned; stores without
    /// batch support may be left partially written.
    pub fn write<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        entries: &[QueueEntry],
        options: &WriteOptions,
    ) -> Result<WriteSummary, QueueError> {
        store.begin()?;

        let summary = match self.write_batch(store, entries, options) {
            Ok(summary) => summary,
            Err(e) => return Err(abort(store, e)),
        };
        if let Err(e) = store.commit() {
            return Err(abort(store, e.into()));
        }

        tracing::debug!(
            mode = ?options.mode,
            cleared = summary.cleared,
            written = summary.written,
            "wrote deferral queue"
        );
        Ok(summary)
    }

    fn write_batch<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        entries: &[QueueEntry],
        options: &WriteOptions,
    ) -> Result<WriteSummary, QueueError> {
        let mut summary = WriteSummary::default();

        if options.mode == WriteMode::Replace {
            for key in self.queue_keys(&*store)? {
                for notice in store.notices(&key)? {
                    store.drop_notice(&notice)?;
                    summary.cleared += 1;
                }
                if options.prune_snapshots {
                    store.drop_snapshot(&key)?;
                }
            }
        }

        for entry in entries {
            store.save_notice(&entry.notice())?;
            store.save_snapshot(entry.handle_path(), entry.snapshot_data())?;
            summary.written += 1;
        }

        Ok(summary)
    }

    fn queue_keys<S: RecordStore + ?Sized>(&self, store: &S) -> Result<Vec<String>, QueueError> {
        let keys = store
            .list_keys()?
            .into_iter()
            .filter(|key| {
                let keep = self.filter.matches(key);
                if !keep {
                    tracing::trace!(key = %key, "skipping non-queue key");
                }
                keep
            })
            .collect();
        Ok(keys)
    }
}

fn abort<S: RecordStore + ?Sized>(store: &mut S, error: QueueError) -> QueueError {
    tracing::warn!(error = %error, "deferral queue write failed, rolling back");
    if let Err(rollback_error) = store.rollback() {
        tracing::warn!(error = %rollback_error, "rollback failed");
    }
    error
}
