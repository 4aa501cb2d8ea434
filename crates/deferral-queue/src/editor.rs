//! Scoped read-modify-write access to the deferral queue.
//!
//! An edit reads the queue once, hands the caller an owned `Vec` to rearrange
//! freely, and replaces the stored queue with the final sequence on commit.
//! Nothing is written unless the edit commits: a closure that returns `Err`,
//! a panic, or dropping an uncommitted [`QueueEdit`] leaves the store as it
//! was.
//!
//! The read-modify-write cycle has no isolation of its own. Running two edits
//! against the same database at once loses one of them.

use crate::codec::{QueueCodec, WriteMode, WriteOptions, WriteSummary};
use crate::entry::QueueEntry;
use crate::error::QueueError;
use crate::filter::{EventKeyFilter, KeyFilter};
use deferral_store::RecordStore;
use std::ops::{Deref, DerefMut};

/// Returns the current queue without opening an edit.
pub fn get_queue<S: RecordStore + ?Sized>(store: &S) -> Result<Vec<QueueEntry>, QueueError> {
    QueueCodec::new().read(store)
}

/// Runs `edit` over the queue and writes the result back if it succeeds.
///
/// The closure's error type only needs a conversion from [`QueueError`], so
/// callers can use their own error enums.
///
/// # Example
///
/// ```rust
/// use deferral_queue::{deferred, edit_queue, get_queue, QueueEntry, QueueError};
/// use deferral_store::MemoryStore;
///
/// let mut store = MemoryStore::new();
///
/// edit_queue(&mut store, |queue| {
///     queue.push(QueueEntry::for_observer("stop", "charm", "on_stop", 1)?);
///     queue.push(deferred("start", "<function charm.on_start at 0x1>")?);
///     queue.sort_by(|a, b| a.name().cmp(b.name()));
///     Ok::<_, QueueError>(())
/// })?;
///
/// let names: Vec<String> = get_queue(&store)?
///     .iter()
///     .map(|e| e.name().to_string())
///     .collect();
/// assert_eq!(names, ["start", "stop"]);
/// # Ok::<(), QueueError>(())
/// ```
pub fn edit_queue<S, T, E>(
    store: &mut S,
    edit: impl FnOnce(&mut Vec<QueueEntry>) -> Result<T, E>,
) -> Result<T, E>
where
    S: RecordStore + ?Sized,
    E: From<QueueError>,
{
    edit_queue_with(store, QueueCodec::new(), edit)
}

/// [`edit_queue`] with a custom codec.
pub fn edit_queue_with<S, F, T, E>(
    store: &mut S,
    codec: QueueCodec<F>,
    edit: impl FnOnce(&mut Vec<QueueEntry>) -> Result<T, E>,
) -> Result<T, E>
where
    S: RecordStore + ?Sized,
    F: KeyFilter,
    E: From<QueueError>,
{
    let mut queue = QueueEdit::begin_with(store, codec)?;
    match edit(queue.entries_mut()) {
        Ok(value) => {
            queue.commit()?;
            Ok(value)
        }
        Err(e) => {
            tracing::debug!("queue edit failed, leaving store unchanged");
            queue.abandon();
            Err(e)
        }
    }
}

/// Reads the queue, passes it through `transform`, and replaces the stored
/// queue with the result. Returns the sequence that was written.
pub fn apply_queue<S: RecordStore + ?Sized>(
    store: &mut S,
    transform: impl FnOnce(Vec<QueueEntry>) -> Vec<QueueEntry>,
) -> Result<Vec<QueueEntry>, QueueError> {
    apply_queue_with(store, QueueCodec::new(), transform)
}

/// [`apply_queue`] with a custom codec.
pub fn apply_queue_with<S, F>(
    store: &mut S,
    codec: QueueCodec<F>,
    transform: impl FnOnce(Vec<QueueEntry>) -> Vec<QueueEntry>,
) -> Result<Vec<QueueEntry>, QueueError>
where
    S: RecordStore + ?Sized,
    F: KeyFilter,
{
    let entries = transform(codec.read(&*store)?);
    codec.write(store, &entries, &WriteOptions::default())?;
    Ok(entries)
}

/// An open edit of the queue.
///
/// Derefs to the `Vec<QueueEntry>` read at [`begin`](Self::begin). Call
/// [`commit`](Self::commit) to replace the stored queue; dropping the edit
/// without committing writes nothing.
pub struct QueueEdit<'s, S: RecordStore + ?Sized, F: KeyFilter = EventKeyFilter> {
    store: &'s mut S,
    codec: QueueCodec<F>,
    entries: Vec<QueueEntry>,
    prune_snapshots: bool,
}

impl<'s, S: RecordStore + ?Sized> QueueEdit<'s, S> {
    /// Reads the queue and opens an edit over it.
    pub fn begin(store: &'s mut S) -> Result<Self, QueueError> {
        Self::begin_with(store, QueueCodec::new())
    }
}

impl<'s, S: RecordStore + ?Sized, F: KeyFilter> QueueEdit<'s, S, F> {
    /// Reads the queue with `codec` and opens an edit over it.
    pub fn begin_with(store: &'s mut S, codec: QueueCodec<F>) -> Result<Self, QueueError> {
        let entries = codec.read(&*store)?;
        Ok(Self {
            store,
            codec,
            entries,
            prune_snapshots: false,
        })
    }

    /// Also delete the snapshots of cleared keys when committing.
    pub fn prune_snapshots(&mut self, prune: bool) -> &mut Self {
        self.prune_snapshots = prune;
        self
    }

    /// The entries as currently edited.
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Mutable access to the edited entries.
    pub fn entries_mut(&mut self) -> &mut Vec<QueueEntry> {
        &mut self.entries
    }

    /// Replaces the stored queue with the edited entries.
    pub fn commit(self) -> Result<WriteSummary, QueueError> {
        let options = WriteOptions {
            mode: WriteMode::Replace,
            prune_snapshots: self.prune_snapshots,
        };
        self.codec.write(self.store, &self.entries, &options)
    }

    /// Discards the edit, returning the entries without writing them.
    pub fn abandon(self) -> Vec<QueueEntry> {
        self.entries
    }
}

impl<S: RecordStore + ?Sized, F: KeyFilter> Deref for QueueEdit<'_, S, F> {
    type Target = Vec<QueueEntry>;

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl<S: RecordStore + ?Sized, F: KeyFilter> DerefMut for QueueEdit<'_, S, F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entries
    }
}
