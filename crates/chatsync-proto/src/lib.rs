//! Wire types for chatsync
//!
//! Two independent sources feed the synchronization engine, and this crate
//! owns the data shapes of both:
//!
//! - [`Frame`]: the JSON object carried by the ephemeral transport (live
//!   messages, typing indicators, join announcements).
//! - [`store`]: the documents held by the durable store (`users/{uid}`,
//!   `chatRooms/{roomId}`, `messages/{id}`).
//!
//! Identifiers are strongly typed ([`UserId`], [`RoomId`]) so that a room id
//! can never be passed where a user id is expected.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
mod frame;
mod ids;
pub mod store;

pub use errors::{ProtocolError, Result};
pub use frame::{Frame, FrameKind};
pub use ids::{RoomId, SYSTEM_USER_ID, UserId};
pub use store::{RoomDocument, RoomKind, StoredMessage, UserDocument};
