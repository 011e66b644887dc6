//! Displayed chat messages.

use chatsync_proto::{Frame, FrameKind, RoomId, StoredMessage, UserId};
use chrono::{DateTime, FixedOffset, Utc};

/// A message as shown in a room's live view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Store document id, absent for messages received live
    pub id: Option<String>,
    /// Sender id
    pub sender_id: UserId,
    /// Sender display name
    pub sender_name: String,
    /// Room
    pub room_id: RoomId,
    /// Body text
    pub body: String,
    /// Send time
    pub sent_at: DateTime<Utc>,
    /// Rendered `sent_at`
    pub display_time: String,
}

impl Message {
    /// Build from a live `message` frame. `arrived_at` stands in for a
    /// missing producer timestamp and is the reference for `display_time`.
    pub fn from_frame(frame: &Frame, arrived_at: DateTime<Utc>, offset: FixedOffset) -> Option<Self> {
        if frame.kind != FrameKind::Message {
            return None;
        }
        let sent_at = frame.timestamp.unwrap_or(arrived_at);
        Some(Self {
            id: None,
            sender_id: frame.user_id.clone(),
            sender_name: frame.username.clone(),
            room_id: frame.room_id.clone(),
            body: frame.text.clone().unwrap_or_default(),
            sent_at,
            display_time: display_time(sent_at, arrived_at, offset),
        })
    }

    /// Build from a persisted history entry.
    pub fn from_stored(stored: StoredMessage, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let display_time = display_time(stored.timestamp, now, offset);
        Self {
            id: stored.id,
            sender_id: stored.user_id,
            sender_name: stored.username,
            room_id: stored.room_id,
            body: stored.text,
            sent_at: stored.timestamp,
            display_time,
        }
    }

    /// Same sender, body and send time. Used to recognise a live frame that
    /// is already part of the loaded history window.
    pub fn same_content(&self, other: &Self) -> bool {
        self.sender_id == other.sender_id && self.body == other.body && self.sent_at == other.sent_at
    }
}

/// Render a send time relative to `now`.
///
/// Same calendar day (in `offset`) renders as `Today, 3:07 PM`, anything else
/// as `5/1/2024, 3:07 PM`.
pub fn display_time(sent_at: DateTime<Utc>, now: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = sent_at.with_timezone(&offset);
    if local.date_naive() == now.with_timezone(&offset).date_naive() {
        local.format("Today, %-I:%M %p").to_string()
    } else {
        local.format("%-m/%-d/%Y, %-I:%M %p").to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Offset, TimeZone};

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn same_day_renders_today() {
        assert_eq!(display_time(at(15, 7), at(23, 0), Utc.fix()), "Today, 3:07 PM");
        assert_eq!(display_time(at(0, 30), at(1, 0), Utc.fix()), "Today, 12:30 AM");
    }

    #[test]
    fn other_day_renders_full_date() {
        let yesterday = Utc.with_ymd_and_hms(2024, 4, 30, 9, 5, 0).unwrap();
        assert_eq!(display_time(yesterday, at(8, 0), Utc.fix()), "4/30/2024, 9:05 AM");
    }

    #[test]
    fn calendar_day_follows_offset() {
        // 23:30 UTC on May 1st is already May 2nd at +02:00.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let sent = at(23, 30);
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        assert_eq!(display_time(sent, now, plus_two), "Today, 1:30 AM");
        assert_eq!(display_time(sent, now, Utc.fix()), "5/1/2024, 11:30 PM");
    }

    #[test]
    fn frame_without_timestamp_uses_arrival_time() {
        let mut frame = Frame::message("u1".into(), "Amy", "r".into(), "hi", at(10, 0));
        frame.timestamp = None;
        let msg = Message::from_frame(&frame, at(12, 0), Utc.fix()).unwrap();
        assert_eq!(msg.sent_at, at(12, 0));
        assert_eq!(msg.display_time, "Today, 12:00 PM");
    }

    #[test]
    fn control_frames_are_not_messages() {
        let frame = Frame::join("u1".into(), "Amy", "r".into());
        assert!(Message::from_frame(&frame, at(12, 0), Utc.fix()).is_none());
    }
}
