//! Inspect and rewrite a persisted deferred-event queue.
//!
//! A host application postpones event deliveries by storing, for each one, a
//! notice `(handle_path, owner, observer)` and a snapshot of the event's state
//! in a [`RecordStore`](deferral_store::RecordStore). This crate provides:
//! - [`QueueEntry`]: one deferred event reconstructed from those records
//! - [`EventKeyFilter`]: tells queue keys (`"<owner>/on/<event>[<id>]"`) apart
//!   from unrelated records in the same store
//! - [`QueueCodec`]: reads the queue in store order and writes it back with
//!   replace or append semantics
//! - [`deferred`] and [`QueueEntry::for_observer`]: build new entries
//! - [`edit_queue`], [`apply_queue`] and [`QueueEdit`]: read-modify-write
//!   transactions that only write back on success
//!
//! ## Quick Start
//!
//! ```rust
//! use deferral_queue::{deferred, edit_queue, get_queue, QueueError};
//! use deferral_store::SqliteStore;
//!
//! let mut store = SqliteStore::open_in_memory()?;
//!
//! edit_queue(&mut store, |queue| {
//!     queue.push(deferred("install", "<function MyCharm._on_event at 0x7f>")?);
//!     queue.push(deferred("start", "<function MyCharm._on_event at 0x7f>")?);
//!     Ok::<_, QueueError>(())
//! })?;
//!
//! // Drop `install` and move everything else after a new `config_changed`.
//! edit_queue(&mut store, |queue| {
//!     queue.retain(|e| e.name() != "install");
//!     queue.insert(0, deferred("config_changed", "<function MyCharm._on_event at 0x7f>")?);
//!     Ok::<_, QueueError>(())
//! })?;
//!
//! let names: Vec<String> = get_queue(&store)?
//!     .iter()
//!     .map(|e| e.name().to_string())
//!     .collect();
//! assert_eq!(names, ["config_changed", "start"]);
//! # Ok::<(), QueueError>(())
//! ```
//!
//! ## Failure semantics
//!
//! Store errors other than a missing snapshot propagate unchanged as
//! [`QueueError::Store`]. Writes run inside the store's batch hooks, so a
//! backend with transactions (such as
//! [`SqliteStore`](deferral_store::SqliteStore)) never exposes a half-written
//! queue.

#![deny(missing_docs)]

/// Queue codec: store records to entries and back.
pub mod codec;
/// Entry construction from handler descriptions.
pub mod constructor;
/// Read-modify-write transactions over the queue.
pub mod editor;
/// Queue entry model.
pub mod entry;
/// Error types for queue operations.
pub mod error;
/// Store key filtering.
pub mod filter;

pub use codec::{QueueCodec, WriteMode, WriteOptions, WriteSummary};
pub use constructor::{deferred, deferred_fn, deferred_with, describe_handler, parse_handler};
pub use editor::{apply_queue, apply_queue_with, edit_queue, edit_queue_with, get_queue, QueueEdit};
pub use entry::QueueEntry;
pub use error::QueueError;
pub use filter::{EventKeyFilter, KeyFilter, OwnerFilter, EVENT_KEY_PATTERN};
