//! What a user would see, captured at one render.
//!
//! Shutdown releases the open room, so tests that inspect a finished run
//! look at the last view captured while the session was still up.

use std::collections::BTreeMap;

use chatsync_client::{Client, Environment, Room, SessionState};
use chatsync_core::{Message, TypingUser};
use chatsync_proto::RoomId;

/// Client state as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientView {
    /// Open room.
    pub active_room: Option<RoomId>,
    /// Messages of the open room, oldest first.
    pub messages: Vec<Message>,
    /// Remote user typing in the open room.
    pub typing_user: Option<TypingUser>,
    /// Local composing flag.
    pub is_typing: bool,
    /// Unread counters.
    pub unread: BTreeMap<RoomId, u32>,
    /// Resolved room list.
    pub rooms: Vec<Room>,
    /// Transport session state.
    pub session_state: SessionState,
}

impl ClientView {
    /// Capture `client`.
    pub fn capture<E: Environment>(client: &Client<E>) -> Self {
        Self {
            active_room: client.active_room().cloned(),
            messages: client.messages().to_vec(),
            typing_user: client.typing_user().cloned(),
            is_typing: client.is_typing(),
            unread: client.unread().as_map().clone(),
            rooms: client.room_list(),
            session_state: client.session_state(),
        }
    }

    /// Message bodies in display order.
    pub fn bodies(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.body.as_str()).collect()
    }

    /// Unread count for `room_id`; zero when absent.
    pub fn unread(&self, room_id: &RoomId) -> u32 {
        self.unread.get(room_id).copied().unwrap_or(0)
    }

    /// Room list entry for `room_id`.
    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| room.room_id == *room_id)
    }
}
