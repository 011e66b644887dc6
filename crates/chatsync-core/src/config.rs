//! Synchronization configuration.

use std::time::Duration;

use chatsync_proto::RoomId;
use chrono::{FixedOffset, Offset, Utc};

/// Idle window after the last keystroke before `stop_typing` is sent.
pub const DEFAULT_TYPING_IDLE_WINDOW: Duration = Duration::from_millis(2000);

/// Number of most recent persisted messages loaded when a room opens.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Room id of the shared room every user starts in.
pub const GENERAL_ROOM_ID: &str = "general";

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Typing idle timeout
    pub typing_idle_window: Duration,
    /// History window size
    pub history_limit: usize,
    /// Offset used to render message display times
    pub display_offset: FixedOffset,
    /// Room opened when the active room is left or deleted. `None` leaves no
    /// room open.
    pub default_room: Option<RoomId>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            typing_idle_window: DEFAULT_TYPING_IDLE_WINDOW,
            history_limit: DEFAULT_HISTORY_LIMIT,
            display_offset: Utc.fix(),
            default_room: Some(RoomId::from(GENERAL_ROOM_ID)),
        }
    }
}
