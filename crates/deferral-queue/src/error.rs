//! Error types for queue operations.

use deferral_store::StoreError;
use thiserror::Error;

/// Errors that can occur while reading, building or rewriting the queue.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Store-level failure, propagated unchanged.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Handler description matched neither the plain-function nor the
    /// bound-method shape; build the entry manually instead.
    #[error("cannot construct a queue entry from handler {input}; build it manually")]
    UnrecognizedHandlerFormat {
        /// The unmatched handler description.
        input: String,
    },
    /// A handle path component is empty or contains `/`, `[` or `]`.
    #[error("{field} ('{value}') is not a valid identifier")]
    InvalidIdentifier {
        /// Component that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}
