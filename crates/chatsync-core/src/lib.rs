//! Synchronization core for chatsync
//!
//! Pure state machines for the pieces of a chat client that have to reconcile
//! the ephemeral transport with the durable store:
//!
//! - [`connection`]: transport session lifecycle and the single handler slot
//! - [`typing`]: local typing-indicator debouncing
//! - [`room_session`]: history + live merge for the active room
//! - [`unread`]: optimistic and authoritative unread counters
//! - [`membership`]: cached ∪ pending room membership
//!
//! Nothing in this crate performs I/O. Time enters as arguments, randomness
//! and clocks through [`Environment`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod env;
pub mod error;
pub mod membership;
pub mod message;
pub mod room_session;
pub mod typing;
pub mod unread;

pub use config::SyncConfig;
pub use connection::{ConnectionAction, ConnectionManager, Delivery, SessionState, SubscriptionToken};
pub use env::Environment;
pub use error::{ConnectionError, SyncError};
pub use membership::{MembershipReconciler, Room};
pub use message::Message;
pub use room_session::{Generation, LiveOutcome, Phase, RoomSession, TypingUser};
pub use typing::{TypingDebouncer, TypingSignal, TypingState};
pub use unread::{UnreadLedger, merge_unread};
