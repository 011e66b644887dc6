//! Error types for the synchronization core.
//!
//! Connection errors cover the ephemeral transport session, sync errors cover
//! room-level bookkeeping. None of them is fatal to the process: the worst
//! outcome is an `Errored` session that has to be replaced.

use chatsync_proto::{ProtocolError, RoomId};
use thiserror::Error;

use crate::{connection::SessionState, room_session::Generation};

/// Errors from the connection manager.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// A frame was sent while the session was not connected. The frame was
    /// dropped.
    #[error("not connected: frame dropped in state {state:?}")]
    NotConnected {
        /// State at the time of the send
        state: SessionState,
    },

    /// `connect()` was called on a session that already failed.
    #[error("session errored; create a new session to reconnect")]
    Terminal,

    /// Outbound frame could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl ConnectionError {
    /// Returns true if a later attempt at the same operation may succeed
    /// without replacing the session.
    ///
    /// A send while still connecting may succeed once the transport opens. A
    /// terminal error never recovers within this session.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotConnected { state: SessionState::Connecting })
    }
}

impl From<ProtocolError> for ConnectionError {
    fn from(err: ProtocolError) -> Self {
        Self::Encode(err.to_string())
    }
}

/// Errors from room-level synchronization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Operation requires an open room.
    #[error("no active room")]
    NoActiveRoom,

    /// An async result arrived for an abandoned room activation.
    #[error("stale result: expected generation {expected}, got {got}")]
    StaleResult {
        /// Generation of the current activation
        expected: Generation,
        /// Generation the result was tagged with
        got: Generation,
    },

    /// Room is not part of the membership view.
    #[error("unknown room: {0}")]
    UnknownRoom(RoomId),

    /// Outgoing message body was empty after trimming.
    #[error("empty message")]
    EmptyMessage,

    /// Operation is reserved for the group administrator.
    #[error("not the administrator of {0}")]
    NotAdmin(RoomId),

    /// Only group rooms other than the default room can be left.
    #[error("cannot leave {0}")]
    NotLeavable(RoomId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_send_while_connecting_is_transient() {
        assert!(ConnectionError::NotConnected { state: SessionState::Connecting }.is_transient());

        assert!(
            !ConnectionError::NotConnected { state: SessionState::Disconnected }.is_transient()
        );
        assert!(!ConnectionError::NotConnected { state: SessionState::Errored }.is_transient());
        assert!(!ConnectionError::Terminal.is_transient());
    }

    #[test]
    fn stale_result_names_both_generations() {
        let err = SyncError::StaleResult { expected: Generation::new(3), got: Generation::new(2) };
        assert_eq!(err.to_string(), "stale result: expected generation 3, got 2");
    }
}
