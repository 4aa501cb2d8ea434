//! Key filtering: which store keys belong to the deferral queue.

use regex::Regex;

/// Pattern for deferred-event handle paths: `<owner>/on/<event>[<id>]`.
pub const EVENT_KEY_PATTERN: &str = r"^[^/\[\]]+/on/[^/\[\]]+\[[0-9]+\]$";

/// Trait for deciding whether a store key is a queue entry.
pub trait KeyFilter {
    /// Returns true if `key` belongs to the queue.
    fn matches(&self, key: &str) -> bool;
}

impl<F: Fn(&str) -> bool> KeyFilter for F {
    fn matches(&self, key: &str) -> bool {
        self(key)
    }
}

/// Accepts keys shaped like `"<owner>/on/<event_name>[<integer>]"`.
///
/// Owner and event name are runs of characters other than `/`, `[` and `]`.
/// The matcher is compiled once per filter value.
///
/// Keys with a nested owner path, such as
/// `"MyCharm/IngressRequirer[ingress]/on/ready[5]"`, are valid deferrals for
/// the host framework but are not matched here. Such entries are never read,
/// edited or cleared by this crate; supply a custom [`KeyFilter`] to reach
/// them.
///
/// # Example
///
/// ```rust
/// use deferral_queue::{EventKeyFilter, KeyFilter};
///
/// let filter = EventKeyFilter::new();
/// assert!(filter.matches("charm/on/start[1]"));
/// assert!(!filter.matches("StoredStateData[_stored]"));
/// ```
#[derive(Debug, Clone)]
pub struct EventKeyFilter {
    pattern: Regex,
}

impl EventKeyFilter {
    /// Creates a filter with a freshly compiled matcher.
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(EVENT_KEY_PATTERN).expect("invalid regex"),
        }
    }
}

impl Default for EventKeyFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyFilter for EventKeyFilter {
    fn matches(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }
}

/// Restricts another filter to keys owned by `owner`.
#[derive(Debug, Clone)]
pub struct OwnerFilter<F: KeyFilter = EventKeyFilter> {
    /// Owner path segment to match (the part before `/on/`).
    pub owner: String,
    /// Filter every key must also pass.
    pub inner: F,
}

impl OwnerFilter {
    /// Matches event keys owned by `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            inner: EventKeyFilter::new(),
        }
    }
}

impl<F: KeyFilter> KeyFilter for OwnerFilter<F> {
    fn matches(&self, key: &str) -> bool {
        self.inner.matches(key)
            && key
                .split_once("/on/")
                .map(|(owner, _)| owner == self.owner)
                .unwrap_or(false)
    }
}
