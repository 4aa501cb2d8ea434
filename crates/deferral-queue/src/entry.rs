//! Queue entry model.

use crate::error::QueueError;
use deferral_store::{Notice, SnapshotData};
use serde::{Deserialize, Serialize};

/// One deferred event: a notice plus its saved snapshot.
///
/// Entries are immutable values. They come either from the store (see
/// [`QueueCodec::read`](crate::QueueCodec::read)) or from caller intent (see
/// [`QueueEntry::for_observer`] and [`deferred`](crate::deferred)). An entry
/// is removed from the store by leaving it out of the next replace-write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    handle_path: String,
    owner: String,
    observer: String,
    #[serde(default)]
    snapshot_data: SnapshotData,
}

impl QueueEntry {
    /// Creates an entry with an empty snapshot, without validation; callers
    /// are responsible for the `"<owner>/on/<event>[<id>]"` shape.
    pub fn new(
        handle_path: impl Into<String>,
        owner: impl Into<String>,
        observer: impl Into<String>,
    ) -> Self {
        Self {
            handle_path: handle_path.into(),
            owner: owner.into(),
            observer: observer.into(),
            snapshot_data: SnapshotData::new(),
        }
    }

    /// Builds an entry for `observer` on `owner`, composing the handle path
    /// `"<owner>/on/<event_name>[<event_id>]"`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use deferral_queue::QueueEntry;
    ///
    /// let entry = QueueEntry::for_observer("update_status", "unit", "on_update_status", 7)?;
    /// assert_eq!(entry.handle_path(), "unit/on/update_status[7]");
    /// assert_eq!(entry.name(), "update_status");
    /// # Ok::<(), deferral_queue::QueueError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidIdentifier`] if `event_name`, `owner` or
    /// `observer` is empty or contains `/`, `[` or `]`.
    pub fn for_observer(
        event_name: &str,
        owner: &str,
        observer: &str,
        event_id: u64,
    ) -> Result<Self, QueueError> {
        validate_identifier("event_name", event_name)?;
        validate_identifier("owner", owner)?;
        validate_identifier("observer", observer)?;
        Ok(Self::new(
            format!("{owner}/on/{event_name}[{event_id}]"),
            owner,
            observer,
        ))
    }

    /// Reconstructs an entry from a stored notice and its snapshot.
    pub fn from_notice(notice: Notice, snapshot_data: SnapshotData) -> Self {
        Self {
            handle_path: notice.key,
            owner: notice.owner,
            observer: notice.observer,
            snapshot_data,
        }
    }

    /// Returns a copy of this entry carrying `snapshot_data`.
    pub fn with_snapshot(mut self, snapshot_data: SnapshotData) -> Self {
        self.snapshot_data = snapshot_data;
        self
    }

    /// Handle path identifying the notice.
    pub fn handle_path(&self) -> &str {
        &self.handle_path
    }

    /// Path of the object owning the observer.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Name of the handler bound to this notice.
    pub fn observer(&self) -> &str {
        &self.observer
    }

    /// Saved event state (may be empty).
    pub fn snapshot_data(&self) -> &SnapshotData {
        &self.snapshot_data
    }

    /// Event name: the last path segment without its bracketed index.
    ///
    /// `"charm/on/start[3]"` yields `"start"`.
    pub fn name(&self) -> &str {
        let last = self
            .handle_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.handle_path);
        last.split('[').next().unwrap_or(last)
    }

    /// Numeric disambiguator from the trailing `[<id>]`, if present.
    pub fn event_id(&self) -> Option<u64> {
        let last = self.handle_path.rsplit('/').next()?;
        let open = last.find('[')?;
        last[open + 1..].strip_suffix(']')?.parse().ok()
    }

    /// The `(handle_path, owner, observer)` notice for this entry.
    pub fn notice(&self) -> Notice {
        Notice::new(
            self.handle_path.clone(),
            self.owner.clone(),
            self.observer.clone(),
        )
    }
}

pub(crate) fn validate_identifier(field: &'static str, value: &str) -> Result<(), QueueError> {
    if value.is_empty() || value.contains(['/', '[', ']']) {
        return Err(QueueError::InvalidIdentifier {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
