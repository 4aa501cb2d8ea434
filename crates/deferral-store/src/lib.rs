//! Record store port and reference backends for persisted deferred-event queues.
//!
//! This crate provides:
//! - The [`RecordStore`] trait: notices and snapshots keyed by handle path
//! - [`MemoryStore`]: insertion-ordered in-memory backend
//! - [`SqliteStore`]: SQLite backend laid out like the host framework's
//!   unit-state database
//!
//! ## Quick Start
//!
//! ```rust
//! use deferral_store::{Notice, RecordStore, SnapshotData, SqliteStore};
//! use serde_json::json;
//!
//! let mut store = SqliteStore::open_in_memory()?;
//! let notice = Notice::new("charm/on/config_changed[3]", "charm", "on_config_changed");
//!
//! let mut data = SnapshotData::new();
//! data.insert("reason".to_string(), json!("waiting for leader"));
//!
//! store.save_notice(&notice)?;
//! store.save_snapshot(&notice.key, &data)?;
//!
//! for key in store.list_keys()? {
//!     for notice in store.notices(&key)? {
//!         println!("{} -> {}.{}", notice.key, notice.owner, notice.observer);
//!     }
//! }
//! # Ok::<(), deferral_store::StoreError>(())
//! ```

#![deny(missing_docs)]

/// Error types for store operations.
pub mod errors;
/// In-memory backend.
pub mod memory;
/// Notice and snapshot record types.
pub mod record;
/// SQLite backend.
pub mod sqlite;
/// Storage backend trait.
pub mod traits;

pub use errors::StoreError;
pub use memory::MemoryStore;
pub use record::{Notice, SnapshotData};
pub use sqlite::{SqliteOptions, SqliteStore};
pub use traits::RecordStore;
