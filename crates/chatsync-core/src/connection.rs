//! Ephemeral transport session state machine.
//!
//! Owns the lifecycle of the single duplex connection a client holds and the
//! single inbound-handler slot. Uses the action pattern: methods return
//! [`ConnectionAction`]s for the driver to execute instead of touching the
//! socket.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect ┌────────────┐ opened ┌───────────┐
//! │ Disconnected │────────>│ Connecting │───────>│ Connected │
//! └──────────────┘         └────────────┘        └───────────┘
//!        ^                   │        │ failed          │
//!        │ close             │        ↓                 │ failed
//!        └───────────────────┘   ┌─────────┐            │
//!          (also from Connected) │ Errored │<───────────┘
//!                                └─────────┘
//! ```
//!
//! `Errored` is terminal. A failed session is replaced, never reconnected.
//!
//! # Handler slot
//!
//! [`ConnectionManager::subscribe`] hands out a [`SubscriptionToken`]. Only
//! the most recent token receives deliveries; subscribing again silently
//! retires the previous one. [`ConnectionManager::unsubscribe`] only clears
//! the slot when given the current token, so a room that was already replaced
//! cannot tear down its successor's registration.

use chatsync_proto::{Frame, ProtocolError};

use crate::error::ConnectionError;

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open the transport to the configured endpoint
    Open,
    /// Send this encoded text frame
    Transmit(String),
    /// Close the transport
    Close,
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No transport
    Disconnected,
    /// Transport requested, not yet open
    Connecting,
    /// Transport open
    Connected,
    /// Transport failed; terminal
    Errored,
}

/// Handle identifying one inbound-handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    /// Raw token value, for logging.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A decoded inbound frame addressed to the current handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Registration the frame is delivered to
    pub token: SubscriptionToken,
    /// Decoded frame
    pub frame: Frame,
}

/// Connection manager.
///
/// Pure state machine: no I/O, no clocks.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    state: SessionState,
    handler: Option<SubscriptionToken>,
    next_token: u64,
    last_error: Option<String>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Create a manager in [`SessionState::Disconnected`].
    pub fn new() -> Self {
        Self { state: SessionState::Disconnected, handler: None, next_token: 1, last_error: None }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True while the transport is open.
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Currently registered handler, if any.
    pub fn handler(&self) -> Option<SubscriptionToken> {
        self.handler
    }

    /// Reason of the transport failure that errored this session.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Request the transport.
    ///
    /// Idempotent: returns `None` when already connecting or connected.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::Terminal` if the session already failed
    pub fn connect(&mut self) -> Result<Option<ConnectionAction>, ConnectionError> {
        match self.state {
            SessionState::Disconnected => {
                self.state = SessionState::Connecting;
                tracing::debug!("transport connecting");
                Ok(Some(ConnectionAction::Open))
            },
            SessionState::Connecting | SessionState::Connected => Ok(None),
            SessionState::Errored => Err(ConnectionError::Terminal),
        }
    }

    /// The transport finished opening.
    ///
    /// If the session was closed while the transport was still opening, the
    /// freshly opened transport is closed again.
    pub fn opened(&mut self) -> Option<ConnectionAction> {
        match self.state {
            SessionState::Connecting => {
                self.state = SessionState::Connected;
                tracing::info!("transport connected");
                None
            },
            SessionState::Disconnected => Some(ConnectionAction::Close),
            SessionState::Connected | SessionState::Errored => None,
        }
    }

    /// The transport failed or was closed by the peer.
    ///
    /// Moves an active session to `Errored` and releases the handler. A
    /// session that was already closed locally stays `Disconnected`.
    pub fn failed(&mut self, reason: impl Into<String>) -> Option<ConnectionAction> {
        match self.state {
            SessionState::Connecting | SessionState::Connected => {
                let reason = reason.into();
                tracing::warn!(%reason, "transport failed; session errored");
                self.state = SessionState::Errored;
                self.handler = None;
                self.last_error = Some(reason);
                Some(ConnectionAction::Close)
            },
            SessionState::Disconnected | SessionState::Errored => None,
        }
    }

    /// Encode a frame for transmission.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::NotConnected` if the transport is not open; the
    ///   frame is dropped, never queued
    /// - `ConnectionError::Encode` if the frame cannot be encoded
    pub fn send(&self, frame: &Frame) -> Result<ConnectionAction, ConnectionError> {
        if self.state != SessionState::Connected {
            tracing::warn!(
                state = ?self.state,
                kind = ?frame.kind,
                room_id = %frame.room_id,
                "dropping outbound frame: not connected"
            );
            return Err(ConnectionError::NotConnected { state: self.state });
        }
        Ok(ConnectionAction::Transmit(frame.encode()?))
    }

    /// Register the inbound handler, replacing any previous registration.
    pub fn subscribe(&mut self) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        if let Some(previous) = self.handler.replace(token) {
            tracing::debug!(previous = previous.0, current = token.0, "handler replaced");
        }
        token
    }

    /// Release a registration. Returns `false` if `token` is not the current
    /// handler, in which case nothing changes.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        if self.handler == Some(token) {
            self.handler = None;
            true
        } else {
            false
        }
    }

    /// Route one inbound text frame.
    ///
    /// Returns `Ok(None)` when no handler is registered or the session is not
    /// connected; the frame is dropped.
    ///
    /// # Errors
    ///
    /// - `ProtocolError` if the frame is malformed. Recoverable: the caller
    ///   logs and drops it.
    pub fn deliver(&self, raw: &str) -> Result<Option<Delivery>, ProtocolError> {
        if self.state != SessionState::Connected {
            return Ok(None);
        }
        let Some(token) = self.handler else {
            tracing::debug!("no handler registered; inbound frame dropped");
            return Ok(None);
        };
        let frame = Frame::decode(raw)?;
        Ok(Some(Delivery { token, frame }))
    }

    /// Tear down the transport and clear the handler.
    ///
    /// Safe to call repeatedly. An `Errored` session stays `Errored`.
    pub fn close(&mut self) -> Option<ConnectionAction> {
        self.handler = None;
        match self.state {
            SessionState::Connecting | SessionState::Connected => {
                self.state = SessionState::Disconnected;
                tracing::debug!("transport closed");
                Some(ConnectionAction::Close)
            },
            SessionState::Disconnected | SessionState::Errored => None,
        }
    }
}
