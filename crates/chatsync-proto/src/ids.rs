//! Identifier newtypes.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// Sender id used for messages generated by the application itself (leave
/// announcements and similar).
pub const SYSTEM_USER_ID: &str = "system";

/// Stable user identifier issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id of the synthetic system sender.
    pub fn system() -> Self {
        Self(SYSTEM_USER_ID.to_owned())
    }

    /// Raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for an empty id, which no real user can have.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Room identifier.
///
/// Direct rooms use a deterministic id derived from both participants; group
/// rooms use a random UUID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Separator between the two participant ids of a direct room.
    pub const DIRECT_SEPARATOR: char = '_';

    /// Wrap a raw id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic id of the direct room between `a` and `b`.
    ///
    /// The participant ids are sorted before joining, so argument order does
    /// not matter.
    pub fn direct(a: &UserId, b: &UserId) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{}{}{}", first.as_str(), Self::DIRECT_SEPARATOR, second.as_str()))
    }

    /// Group room id built from 16 random bytes (UUID v4 layout).
    pub fn group_from_random(bytes: [u8; 16]) -> Self {
        let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Self(uuid.hyphenated().to_string())
    }

    /// Raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for an empty id.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

macro_rules! string_id_impls {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $ty {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id_impls!(UserId);
string_id_impls!(RoomId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_room_id_is_sorted_join() {
        let id = RoomId::direct(&UserId::from("zed"), &UserId::from("amy"));
        assert_eq!(id.as_str(), "amy_zed");
    }

    #[test]
    fn direct_room_id_ignores_argument_order() {
        let u1 = UserId::from("u1");
        let u2 = UserId::from("u2");
        assert_eq!(RoomId::direct(&u1, &u2), RoomId::direct(&u2, &u1));
    }

    #[test]
    fn group_room_id_is_uuid_v4() {
        let id = RoomId::group_from_random([7u8; 16]);
        let parsed = uuid::Uuid::parse_str(id.as_str());
        assert!(parsed.is_ok());
        assert_eq!(parsed.map(|u| u.get_version_num()).ok(), Some(4));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&RoomId::from("general")).unwrap();
        assert_eq!(json, "\"general\"");
    }
}
