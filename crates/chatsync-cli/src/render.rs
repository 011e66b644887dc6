//! Line-oriented rendering.
//!
//! The terminal scrolls: every render prints only what changed since the
//! previous one. [`Screen`] remembers what has been shown and turns the
//! client's current state into the lines that are new.

use std::collections::BTreeMap;

use chatsync_client::{Client, Environment, Room, SessionState};
use chatsync_core::Message;
use chatsync_proto::{RoomId, UserId};

/// Format one chat message.
pub fn message_line(message: &Message) -> String {
    if message.sender_id == UserId::system() {
        format!("[{}] * {}", message.display_time, message.body)
    } else {
        format!("[{}] {}: {}", message.display_time, message.sender_name, message.body)
    }
}

/// Format the room list, marking the active room.
pub fn room_lines(rooms: &[Room], active: Option<&RoomId>) -> Vec<String> {
    if rooms.is_empty() {
        return vec!["(no rooms)".to_string()];
    }
    rooms
        .iter()
        .map(|room| {
            let marker = if active == Some(&room.room_id) { '>' } else { ' ' };
            let name =
                if room.display_name.is_empty() { "(loading)" } else { room.display_name.as_str() };
            let mut line = format!("{marker} {name} [{}]", room.room_id);
            if room.unread > 0 {
                line.push_str(&format!(" ({} unread)", room.unread));
            }
            if room.pending {
                line.push_str(" (new)");
            }
            line
        })
        .collect()
}

/// Input prompt for the active room.
pub fn prompt(active: Option<&RoomId>, buffer: &str) -> String {
    match active {
        Some(room_id) => format!("{room_id}> {buffer}"),
        None => format!("> {buffer}"),
    }
}

fn state_line(state: SessionState) -> &'static str {
    match state {
        SessionState::Disconnected => "-- disconnected",
        SessionState::Connecting => "-- connecting",
        SessionState::Connected => "-- connected",
        SessionState::Errored => "-- connection lost",
    }
}

/// What has already been printed.
#[derive(Debug, Default)]
pub struct Screen {
    state: Option<SessionState>,
    room: Option<RoomId>,
    shown: usize,
    typing: Option<String>,
    unread: BTreeMap<RoomId, u32>,
}

impl Screen {
    /// Create an empty screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Room whose messages are on screen.
    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Lines to print to bring the screen up to date with `client`.
    pub fn update<E: Environment>(&mut self, client: &Client<E>) -> Vec<String> {
        let mut lines = Vec::new();

        let state = client.session_state();
        if self.state != Some(state) {
            self.state = Some(state);
            lines.push(state_line(state).to_string());
        }

        let active = client.active_room();
        if self.room.as_ref() != active {
            self.room = active.cloned();
            self.shown = 0;
            self.typing = None;
            lines.push(match active {
                Some(room_id) => {
                    let name = client.membership().display_name(room_id).unwrap_or_default();
                    if name.is_empty() {
                        format!("== {room_id} ==")
                    } else {
                        format!("== {name} [{room_id}] ==")
                    }
                },
                None => "== no room open ==".to_string(),
            });
        }

        let messages = client.messages();
        if messages.len() < self.shown {
            self.shown = 0;
        }
        lines.extend(messages.iter().skip(self.shown).map(message_line));
        self.shown = messages.len();

        let typing = client.typing_user().map(|user| user.username.clone());
        if typing != self.typing {
            if let Some(name) = &typing {
                lines.push(format!("   {name} is typing..."));
            }
            self.typing = typing;
        }

        let unread = client.unread().as_map();
        if *unread != self.unread {
            let counts: Vec<String> = unread
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(room_id, count)| format!("{room_id} ({count})"))
                .collect();
            if !counts.is_empty() {
                lines.push(format!("-- unread: {}", counts.join(", ")));
            }
            self.unread = unread.clone();
        }

        lines
    }
}
