//! Client error types.

use chatsync_core::{ConnectionError, SyncError};
use thiserror::Error;

/// Errors returned by [`crate::Client::handle`].
///
/// None of them leaves the client in an inconsistent state: the event that
/// caused the error had no effect beyond what was already returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Transport session error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Room-level error
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Invalid group name
    #[error("group name must not be empty")]
    EmptyGroupName,

    /// A user cannot open a direct room with themselves
    #[error("cannot open a direct room with yourself")]
    SelfDirect,
}
