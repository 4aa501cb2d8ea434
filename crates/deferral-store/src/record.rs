use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Saved state of a deferred event.
///
/// Keys are field names chosen by the host's event type; values are opaque
/// JSON. An empty map is a valid snapshot.
pub type SnapshotData = BTreeMap<String, Value>;

/// A `(key, owner, observer)` triple marking one pending deferred delivery.
///
/// Several notices may share a key when more than one observer is waiting on
/// the same event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Notice {
    /// Handle path of the deferred event (e.g. `"charm/on/start[1]"`).
    pub key: String,
    /// Path of the object owning the observer.
    pub owner: String,
    /// Name of the handler bound to this notice.
    pub observer: String,
}

impl Notice {
    /// Creates a notice from its three parts.
    pub fn new(
        key: impl Into<String>,
        owner: impl Into<String>,
        observer: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            owner: owner.into(),
            observer: observer.into(),
        }
    }
}
