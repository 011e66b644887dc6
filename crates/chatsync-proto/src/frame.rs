//! Transport frame.
//!
//! A `Frame` is the JSON object exchanged over the ephemeral transport:
//!
//! ```json
//! {"type":"message","userId":"u1","username":"Amy","roomId":"general",
//!  "text":"hi","timestamp":"2024-05-01T12:00:00Z"}
//! ```
//!
//! `text` and `timestamp` are only meaningful for `message` frames and are
//! omitted from the encoding of every other kind.
//!
//! # Invariants
//!
//! - A decoded `message` frame always carries `text`.
//! - `userId` and `roomId` are never empty after [`Frame::decode`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    RoomId, UserId,
    errors::{ProtocolError, Result},
};

/// Frame type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// Chat message for a room.
    Message,
    /// Sender started composing.
    Typing,
    /// Sender stopped composing (idle timeout or message sent).
    StopTyping,
    /// Presence announcement when a room is opened.
    Join,
}

/// Transport frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Frame type.
    #[serde(rename = "type")]
    pub kind: FrameKind,
    /// Sender id.
    pub user_id: UserId,
    /// Sender display name.
    pub username: String,
    /// Target room.
    pub room_id: RoomId,
    /// Message body, `message` frames only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Producer-set send time, `message` frames only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Frame {
    fn control(kind: FrameKind, user_id: UserId, username: String, room_id: RoomId) -> Self {
        Self { kind, user_id, username, room_id, text: None, timestamp: None }
    }

    /// Chat message frame.
    pub fn message(
        user_id: UserId,
        username: impl Into<String>,
        room_id: RoomId,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: FrameKind::Message,
            user_id,
            username: username.into(),
            room_id,
            text: Some(text.into()),
            timestamp: Some(timestamp),
        }
    }

    /// `typing` frame.
    pub fn typing(user_id: UserId, username: impl Into<String>, room_id: RoomId) -> Self {
        Self::control(FrameKind::Typing, user_id, username.into(), room_id)
    }

    /// `stop_typing` frame.
    pub fn stop_typing(user_id: UserId, username: impl Into<String>, room_id: RoomId) -> Self {
        Self::control(FrameKind::StopTyping, user_id, username.into(), room_id)
    }

    /// `join` frame.
    pub fn join(user_id: UserId, username: impl Into<String>, room_id: RoomId) -> Self {
        Self::control(FrameKind::Join, user_id, username.into(), room_id)
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a JSON text frame and validate it.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Malformed` if the input is not a frame object
    /// - `ProtocolError::EmptyField` if `userId` or `roomId` is empty
    /// - `ProtocolError::MissingText` for a `message` frame without `text`
    pub fn decode(raw: &str) -> Result<Self> {
        let frame: Self = serde_json::from_str(raw)?;
        frame.validate()?;
        Ok(frame)
    }

    /// Check structural validity.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.is_empty() {
            return Err(ProtocolError::EmptyField { field: "userId" });
        }
        if self.room_id.is_empty() {
            return Err(ProtocolError::EmptyField { field: "roomId" });
        }
        if self.kind == FrameKind::Message && self.text.is_none() {
            return Err(ProtocolError::MissingText);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn message_frame_wire_shape() {
        let frame = Frame::message("u1".into(), "Amy", "general".into(), "hi", ts());
        insta::assert_snapshot!(
            frame.encode().unwrap(),
            @r#"{"type":"message","userId":"u1","username":"Amy","roomId":"general","text":"hi","timestamp":"2024-05-01T12:00:00Z"}"#
        );
    }

    #[test]
    fn control_frames_omit_message_fields() {
        let frame = Frame::stop_typing("u1".into(), "Amy", "general".into());
        insta::assert_snapshot!(
            frame.encode().unwrap(),
            @r#"{"type":"stop_typing","userId":"u1","username":"Amy","roomId":"general"}"#
        );
    }

    #[test]
    fn decode_accepts_fractional_iso_timestamps() {
        let raw = r#"{"type":"message","userId":"u2","username":"Bo","roomId":"r","text":"yo","timestamp":"2024-05-01T12:00:00.123Z"}"#;
        let frame = Frame::decode(raw).unwrap();
        assert_eq!(frame.kind, FrameKind::Message);
        assert_eq!(frame.text.as_deref(), Some("yo"));
        assert!(frame.timestamp.is_some());
    }

    #[test]
    fn decode_rejects_message_without_text() {
        let raw = r#"{"type":"message","userId":"u2","username":"Bo","roomId":"r"}"#;
        assert!(matches!(Frame::decode(raw), Err(ProtocolError::MissingText)));
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let raw = r#"{"type":"shout","userId":"u2","username":"Bo","roomId":"r"}"#;
        assert!(matches!(Frame::decode(raw), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn decode_rejects_empty_room() {
        let raw = r#"{"type":"typing","userId":"u2","username":"Bo","roomId":""}"#;
        assert!(matches!(Frame::decode(raw), Err(ProtocolError::EmptyField { field: "roomId" })));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Frame::decode("not json").is_err());
        assert!(Frame::decode("").is_err());
        assert!(Frame::decode("[]").is_err());
    }
}
