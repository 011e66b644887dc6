//! Live view of the active room.
//!
//! A `RoomSession` exists for exactly one room activation. It starts in
//! [`Phase::Loading`] while the history window is fetched and moves to
//! [`Phase::Live`] when that fetch resolves.
//!
//! # Invariants
//!
//! - Once live, the message list only grows: history first, then live
//!   frames in arrival order.
//! - A history result is applied only if it carries this activation's
//!   [`Generation`]. Results for abandoned activations are rejected.
//! - Live frames that arrive during loading are held back and appended after
//!   the history window, minus any already contained in it.

use std::fmt;

use chatsync_proto::{RoomId, StoredMessage, UserId};
use chrono::{DateTime, FixedOffset, Utc};

use crate::{connection::SubscriptionToken, error::SyncError, message::Message};

/// Monotonic room-activation counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Wrap a raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value.
    pub fn value(self) -> u64 {
        self.0
    }

    /// The generation after this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// History requested, not yet applied
    Loading,
    /// History applied; live frames append directly
    Live,
}

/// Remote participant currently shown as typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingUser {
    /// User id
    pub user_id: UserId,
    /// Display name at the time of the `typing` frame
    pub username: String,
}

/// Where a live message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveOutcome {
    /// Appended to the visible list
    Appended,
    /// Held until history resolves
    Buffered,
}

/// State of one room activation.
#[derive(Debug, Clone)]
pub struct RoomSession {
    room_id: RoomId,
    generation: Generation,
    subscription: SubscriptionToken,
    phase: Phase,
    messages: Vec<Message>,
    buffered: Vec<Message>,
    typing_user: Option<TypingUser>,
    history_limit: usize,
}

impl RoomSession {
    /// Start an activation in [`Phase::Loading`].
    pub fn new(
        room_id: RoomId,
        generation: Generation,
        subscription: SubscriptionToken,
        history_limit: usize,
    ) -> Self {
        Self {
            room_id,
            generation,
            subscription,
            phase: Phase::Loading,
            messages: Vec::new(),
            buffered: Vec::new(),
            typing_user: None,
            history_limit,
        }
    }

    /// Room id
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Activation generation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Handler registration owned by this activation
    pub fn subscription(&self) -> SubscriptionToken {
        self.subscription
    }

    /// Load phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once history has been applied.
    pub fn is_live(&self) -> bool {
        self.phase == Phase::Live
    }

    /// Visible messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of live messages waiting for history.
    pub fn buffered_len(&self) -> usize {
        self.buffered.len()
    }

    /// Remote user currently typing, if any.
    pub fn typing_user(&self) -> Option<&TypingUser> {
        self.typing_user.as_ref()
    }

    /// Apply the history window fetched for `generation`.
    ///
    /// Entries are sorted by persisted timestamp, trimmed to the most recent
    /// `history_limit`, and followed by any live messages buffered during the
    /// load. Returns the resulting list length.
    ///
    /// # Errors
    ///
    /// - `SyncError::StaleResult` if `generation` is not this activation's
    pub fn apply_history(
        &mut self,
        generation: Generation,
        history: Vec<StoredMessage>,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<usize, SyncError> {
        if generation != self.generation {
            return Err(SyncError::StaleResult { expected: self.generation, got: generation });
        }
        if self.phase == Phase::Live {
            tracing::debug!(room_id = %self.room_id, %generation, "duplicate history result ignored");
            return Ok(self.messages.len());
        }

        let mut window: Vec<StoredMessage> =
            history.into_iter().filter(|stored| stored.room_id == self.room_id).collect();
        window.sort_by_key(|stored| stored.timestamp);
        let excess = window.len().saturating_sub(self.history_limit);
        window.drain(..excess);

        self.messages = window.into_iter().map(|s| Message::from_stored(s, now, offset)).collect();
        let history_len = self.messages.len();

        for message in std::mem::take(&mut self.buffered) {
            let in_history =
                self.messages[..history_len].iter().any(|known| known.same_content(&message));
            if !in_history {
                self.messages.push(message);
            }
        }

        self.phase = Phase::Live;
        tracing::debug!(
            room_id = %self.room_id,
            %generation,
            history = history_len,
            total = self.messages.len(),
            "history applied"
        );
        Ok(self.messages.len())
    }

    /// Add a live message for this room.
    pub fn push_live(&mut self, message: Message) -> LiveOutcome {
        debug_assert_eq!(message.room_id, self.room_id);
        match self.phase {
            Phase::Live => {
                self.messages.push(message);
                LiveOutcome::Appended
            },
            Phase::Loading => {
                self.buffered.push(message);
                LiveOutcome::Buffered
            },
        }
    }

    /// A `typing` frame arrived from another participant.
    pub fn remote_typing(&mut self, user_id: UserId, username: String) {
        self.typing_user = Some(TypingUser { user_id, username });
    }

    /// A `stop_typing` frame arrived.
    pub fn remote_stop_typing(&mut self) {
        self.typing_user = None;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Offset, TimeZone};

    use super::*;
    use crate::connection::ConnectionManager;

    fn token() -> SubscriptionToken {
        ConnectionManager::new().subscribe()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_714_564_800 + secs, 0).unwrap()
    }

    fn stored(room: &str, text: &str, secs: i64) -> StoredMessage {
        StoredMessage {
            id: Some(format!("m{secs}")),
            user_id: "u2".into(),
            username: "Bo".into(),
            room_id: room.into(),
            text: text.into(),
            timestamp: at(secs),
        }
    }

    fn live(room: &str, text: &str, secs: i64) -> Message {
        Message::from_stored(stored(room, text, secs), at(secs), Utc.fix())
    }

    fn session(limit: usize) -> RoomSession {
        RoomSession::new("r1".into(), Generation::new(1), token(), limit)
    }

    fn bodies(session: &RoomSession) -> Vec<&str> {
        session.messages().iter().map(|m| m.body.as_str()).collect()
    }

    #[test]
    fn history_sorted_ascending_and_trimmed() {
        let mut s = session(2);
        let history = vec![stored("r1", "c", 30), stored("r1", "a", 10), stored("r1", "b", 20)];
        s.apply_history(Generation::new(1), history, at(100), Utc.fix()).unwrap();
        assert_eq!(bodies(&s), vec!["b", "c"]);
        assert!(s.is_live());
    }

    #[test]
    fn history_for_other_rooms_is_filtered() {
        let mut s = session(50);
        let history = vec![stored("r1", "mine", 1), stored("r2", "theirs", 2)];
        s.apply_history(Generation::new(1), history, at(100), Utc.fix()).unwrap();
        assert_eq!(bodies(&s), vec!["mine"]);
    }

    #[test]
    fn stale_generation_rejected_without_mutation() {
        let mut s = session(50);
        let result = s.apply_history(
            Generation::new(0),
            vec![stored("r1", "old", 1)],
            at(100),
            Utc.fix(),
        );
        assert_eq!(
            result,
            Err(SyncError::StaleResult { expected: Generation::new(1), got: Generation::new(0) })
        );
        assert!(s.messages().is_empty());
        assert_eq!(s.phase(), Phase::Loading);
    }

    #[test]
    fn live_frames_during_load_follow_history() {
        let mut s = session(50);
        assert_eq!(s.push_live(live("r1", "early", 40)), LiveOutcome::Buffered);
        assert_eq!(s.push_live(live("r1", "dup", 20)), LiveOutcome::Buffered);
        assert!(s.messages().is_empty());

        let history = vec![stored("r1", "h1", 10), stored("r1", "dup", 20)];
        s.apply_history(Generation::new(1), history, at(100), Utc.fix()).unwrap();

        assert_eq!(bodies(&s), vec!["h1", "dup", "early"]);
        assert_eq!(s.buffered_len(), 0);
    }

    #[test]
    fn live_frames_append_in_arrival_order() {
        let mut s = session(50);
        s.apply_history(Generation::new(1), vec![], at(0), Utc.fix()).unwrap();
        // Arrival order wins over producer timestamps.
        s.push_live(live("r1", "second-stamped", 20));
        s.push_live(live("r1", "first-stamped", 10));
        assert_eq!(bodies(&s), vec!["second-stamped", "first-stamped"]);
    }

    #[test]
    fn stop_typing_clears_indicator() {
        let mut s = session(50);
        s.remote_typing("u2".into(), "Bo".into());
        assert_eq!(s.typing_user().map(|t| t.username.as_str()), Some("Bo"));
        s.remote_stop_typing();
        assert!(s.typing_user().is_none());
    }
}
