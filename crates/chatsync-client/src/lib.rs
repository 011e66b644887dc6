//! Client
//!
//! Action-based chat synchronization engine. Reconciles live frames from the
//! ephemeral transport with documents from the durable store for one user
//! session.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO and action-based patterns as
//! [`chatsync_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`])
//! for the caller to execute: transport I/O, durable-store requests and
//! user-visible notices.
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::WsTransport`]: WebSocket bridged to channels
//! - [`transport::connect`]: Open the WebSocket

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod event;

#[cfg(feature = "transport")]
pub mod transport;

pub use chatsync_core::{Environment, Room, SessionState, SyncConfig};
pub use client::{Client, ClientIdentity};
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent, NoticeLevel, RequestKind, StoreReply, StoreRequest};
