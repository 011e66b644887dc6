//! The standard client invariants.

use chatsync_core::SessionState;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// The open room never shows an unread count.
pub struct ActiveRoomUnreadCleared;

impl Invariant for ActiveRoomUnreadCleared {
    fn name(&self) -> &'static str {
        "active_room_unread_cleared"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(active) = &client.active_room else {
                continue;
            };
            if let Some(count) = client.unread.get(active).filter(|c| **c > 0) {
                return Err(Violation::new(
                    self.name(),
                    &client.id,
                    format!("active room {active} has {count} unread"),
                ));
            }
        }
        Ok(())
    }
}

/// The open room is either visible membership or the default room.
///
/// Leaving, deleting or losing a room while it is open must move the client
/// elsewhere.
pub struct ActiveRoomOpenable;

impl Invariant for ActiveRoomOpenable {
    fn name(&self) -> &'static str {
        "active_room_openable"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(active) = &client.active_room else {
                continue;
            };
            let visible = client.visible_rooms.contains(active);
            let is_default = client.default_room.as_ref() == Some(active);
            if !visible && !is_default {
                return Err(Violation::new(
                    self.name(),
                    &client.id,
                    format!("active room {active} not in {:?}", client.visible_rooms),
                ));
            }
        }
        Ok(())
    }
}

/// Every displayed message belongs to the open room.
pub struct MessagesMatchActiveRoom;

impl Invariant for MessagesMatchActiveRoom {
    fn name(&self) -> &'static str {
        "messages_match_active_room"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let stray = match &client.active_room {
                Some(active) => client.message_rooms.iter().find(|room| *room != active),
                None => client.message_rooms.first(),
            };
            if let Some(room) = stray {
                return Err(Violation::new(
                    self.name(),
                    &client.id,
                    format!("message from {room} shown while {:?} is open", client.active_room),
                ));
            }
        }
        Ok(())
    }
}

/// Activation generations never decrease.
pub struct GenerationMonotonicity;

impl Invariant for GenerationMonotonicity {
    fn name(&self) -> &'static str {
        "generation_monotonicity"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            for window in client.generation_history.windows(2) {
                if window[1] < window[0] {
                    return Err(Violation::new(
                        self.name(),
                        &client.id,
                        format!("generation went from {} back to {}", window[0], window[1]),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Once a session has errored it stays errored.
pub struct ErroredIsTerminal;

impl Invariant for ErroredIsTerminal {
    fn name(&self) -> &'static str {
        "errored_is_terminal"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(first) = client.state_history.iter().position(|s| *s == SessionState::Errored)
            else {
                continue;
            };
            if let Some(later) =
                client.state_history[first..].iter().find(|s| **s != SessionState::Errored)
            {
                return Err(Violation::new(
                    self.name(),
                    &client.id,
                    format!("left Errored for {later:?}"),
                ));
            }
        }
        Ok(())
    }
}

/// The local typing flag implies an open room.
pub struct TypingRequiresActiveRoom;

impl Invariant for TypingRequiresActiveRoom {
    fn name(&self) -> &'static str {
        "typing_requires_active_room"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.is_typing && client.active_room.is_none() {
                return Err(Violation::new(self.name(), &client.id, "typing with no room open"));
            }
        }
        Ok(())
    }
}
