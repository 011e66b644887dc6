//! Durable-store documents.
//!
//! These mirror the three collections the engine consumes but does not own:
//! `users/{uid}`, `chatRooms/{roomId}` and `messages/{id}`. Field names match
//! the stored camelCase layout so documents can be deserialized directly from
//! store snapshots.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Frame, FrameKind, RoomId, UserId};

/// Room kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    /// Two participants, deterministic id.
    Direct,
    /// Any number of participants, generated id, has an admin.
    Group,
}

/// `users/{uid}` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    /// Display name.
    pub username: String,
    /// Email, when the account has one.
    #[serde(default)]
    pub email: Option<String>,
    /// Rooms the user belongs to.
    #[serde(default)]
    pub chat_rooms: Vec<RoomId>,
    /// Friend user ids.
    #[serde(default)]
    pub friends: Vec<UserId>,
    /// Authoritative unread counters per room.
    #[serde(default)]
    pub unread_messages: BTreeMap<RoomId, u32>,
    /// Room open when the user last left the chat area.
    #[serde(default)]
    pub last_opened_chat_room: Option<RoomId>,
    /// Last activity time.
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    /// Whether the welcome screen was dismissed.
    #[serde(default)]
    pub seen_welcome: bool,
}

/// `chatRooms/{roomId}` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDocument {
    /// Room id.
    pub room_id: RoomId,
    /// Direct or group.
    #[serde(rename = "type")]
    pub kind: RoomKind,
    /// Participant ids, sorted.
    pub participants: Vec<UserId>,
    /// Group name (empty for direct rooms).
    #[serde(default)]
    pub group_name: Option<String>,
    /// Creator and administrator.
    pub admin_id: UserId,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RoomDocument {
    /// Direct room between `creator` and `counterpart`.
    pub fn direct(creator: &UserId, counterpart: &UserId, created_at: DateTime<Utc>) -> Self {
        let mut participants = vec![creator.clone(), counterpart.clone()];
        participants.sort();
        Self {
            room_id: RoomId::direct(creator, counterpart),
            kind: RoomKind::Direct,
            participants,
            group_name: None,
            admin_id: creator.clone(),
            created_at: Some(created_at),
        }
    }

    /// Group room with `admin` included in the participant list.
    pub fn group(
        room_id: RoomId,
        name: impl Into<String>,
        admin: &UserId,
        members: impl IntoIterator<Item = UserId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut participants: Vec<UserId> = members.into_iter().collect();
        participants.push(admin.clone());
        participants.sort();
        participants.dedup();
        Self {
            room_id,
            kind: RoomKind::Group,
            participants,
            group_name: Some(name.into()),
            admin_id: admin.clone(),
            created_at: Some(created_at),
        }
    }

    /// The other participant of a direct room, as seen by `me`.
    pub fn counterpart(&self, me: &UserId) -> Option<&UserId> {
        if self.kind != RoomKind::Direct {
            return None;
        }
        self.participants.iter().find(|id| *id != me)
    }
}

/// `messages/{id}` document: denormalized copy of a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    /// Store-assigned document id.
    #[serde(default)]
    pub id: Option<String>,
    /// Sender id.
    pub user_id: UserId,
    /// Sender display name.
    pub username: String,
    /// Room the message belongs to.
    pub room_id: RoomId,
    /// Message body.
    pub text: String,
    /// Persisted send time (server timestamp when available).
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    /// Persistable copy of a `message` frame. `None` for other frame kinds.
    pub fn from_frame(frame: &Frame, fallback_time: DateTime<Utc>) -> Option<Self> {
        if frame.kind != FrameKind::Message {
            return None;
        }
        Some(Self {
            id: None,
            user_id: frame.user_id.clone(),
            username: frame.username.clone(),
            room_id: frame.room_id.clone(),
            text: frame.text.clone().unwrap_or_default(),
            timestamp: frame.timestamp.unwrap_or(fallback_time),
        })
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
    fn direct_document_sorts_participants() {
        let doc = RoomDocument::direct(&"zed".into(), &"amy".into(), ts());
        assert_eq!(doc.room_id.as_str(), "amy_zed");
        assert_eq!(doc.participants, vec![UserId::from("amy"), UserId::from("zed")]);
        assert_eq!(doc.admin_id.as_str(), "zed");
    }

    #[test]
    fn group_document_includes_admin_once() {
        let doc = RoomDocument::group(
            "g1".into(),
            "Hikers",
            &"amy".into(),
            vec!["bo".into(), "amy".into()],
            ts(),
        );
        assert_eq!(doc.participants, vec![UserId::from("amy"), UserId::from("bo")]);
        assert_eq!(doc.group_name.as_deref(), Some("Hikers"));
    }

    #[test]
    fn counterpart_only_for_direct_rooms() {
        let direct = RoomDocument::direct(&"amy".into(), &"bo".into(), ts());
        assert_eq!(direct.counterpart(&"amy".into()), Some(&UserId::from("bo")));

        let group = RoomDocument::group("g".into(), "G", &"amy".into(), vec!["bo".into()], ts());
        assert_eq!(group.counterpart(&"amy".into()), None);
    }

    #[test]
    fn user_document_tolerates_missing_fields() {
        let doc: UserDocument =
            serde_json::from_str(r#"{"username":"Amy","unreadMessages":{"r1":3}}"#).unwrap();
        assert_eq!(doc.username, "Amy");
        assert!(doc.chat_rooms.is_empty());
        assert_eq!(doc.unread_messages.get("r1"), Some(&3));
    }

    #[test]
    fn stored_message_from_control_frame_is_none() {
        let frame = Frame::typing("u1".into(), "Amy", "r".into());
        assert!(StoredMessage::from_frame(&frame, ts()).is_none());
    }
}
