//! User intents reported by a driver.

use chatsync_client::ClientEvent;
use chatsync_proto::{RoomId, UserId};

/// Something the user asked for.
///
/// Drivers translate platform input (a key press, a typed command) into
/// intents; the runtime stamps them with the current time and forwards them
/// to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// Select a room.
    OpenRoom(RoomId),
    /// Message another user directly.
    OpenDirect(UserId),
    /// Create a group.
    CreateGroup {
        /// Group name
        name: String,
        /// Members besides the creator
        members: Vec<UserId>,
    },
    /// Leave the chat view.
    CloseRoom,
    /// The composer changed.
    Keystroke,
    /// Send a message to the active room.
    Send(String),
    /// Leave a room.
    Leave(RoomId),
    /// Delete a group (admin only).
    Delete(RoomId),
}

impl UserIntent {
    /// Convert into a client event at `now`.
    pub fn into_event<I>(self, now: I) -> ClientEvent<I> {
        match self {
            Self::OpenRoom(room_id) => ClientEvent::OpenRoom { room_id },
            Self::OpenDirect(counterpart) => ClientEvent::OpenDirect { counterpart },
            Self::CreateGroup { name, members } => ClientEvent::CreateGroup { name, members },
            Self::CloseRoom => ClientEvent::CloseRoom,
            Self::Keystroke => ClientEvent::Keystroke { now },
            Self::Send(text) => ClientEvent::SendMessage { text },
            Self::Leave(room_id) => ClientEvent::LeaveRoom { room_id },
            Self::Delete(room_id) => ClientEvent::DeleteRoom { room_id },
        }
    }
}
