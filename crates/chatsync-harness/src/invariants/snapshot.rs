//! Point-in-time views of client state.
//!
//! Histories are filled in by the driver, which sees every applied event.

use std::collections::BTreeMap;

use chatsync_client::{Client, Environment};
use chatsync_core::SessionState;
use chatsync_proto::RoomId;

/// Every client in the simulation, captured at one instant.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// One entry per simulated client.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Snapshot with no clients.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot of exactly one client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }
}

/// What one client exposes to invariant checks.
#[derive(Debug, Clone, Default)]
pub struct ClientSnapshot {
    /// Client identifier.
    pub id: String,
    /// Currently open room.
    pub active_room: Option<RoomId>,
    /// Configured fallback room.
    pub default_room: Option<RoomId>,
    /// Visible membership (cached ∪ pending).
    pub visible_rooms: Vec<RoomId>,
    /// Local unread counters.
    pub unread: BTreeMap<RoomId, u32>,
    /// Room of every displayed message, in display order.
    pub message_rooms: Vec<RoomId>,
    /// Local composing flag.
    pub is_typing: bool,
    /// Generations observed so far, oldest first.
    pub generation_history: Vec<u64>,
    /// Session states observed so far, oldest first.
    pub state_history: Vec<SessionState>,
}

impl ClientSnapshot {
    /// Capture the current state of `client`. Histories start empty; see
    /// [`ClientSnapshot::with_history`].
    pub fn from_client<E: Environment>(client: &Client<E>) -> Self {
        Self {
            id: client.user_id().to_string(),
            active_room: client.active_room().cloned(),
            default_room: client.config().default_room.clone(),
            visible_rooms: client.membership().visible_room_ids(),
            unread: client.unread().as_map().clone(),
            message_rooms: client.messages().iter().map(|m| m.room_id.clone()).collect(),
            is_typing: client.is_typing(),
            generation_history: vec![client.generation().value()],
            state_history: vec![client.session_state()],
        }
    }

    /// Replace the observation histories.
    #[must_use]
    pub fn with_history(mut self, generations: Vec<u64>, states: Vec<SessionState>) -> Self {
        self.generation_history = generations;
        self.state_history = states;
        self
    }
}
