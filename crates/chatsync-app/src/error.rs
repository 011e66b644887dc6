//! Durable-store errors.

use thiserror::Error;

/// Errors returned by [`crate::DurableStore::execute`].
///
/// The client never retries: a failed read degrades the view, a failed write
/// becomes a transient notice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Document does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Write rejected or interrupted
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Store unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the request may succeed if issued again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
