//! Durable-store seam.
//!
//! The client only describes store work as [`StoreRequest`] values. A
//! [`DurableStore`] executes them and publishes the user's profile document
//! whenever it changes, which is how membership and unread updates made by
//! other clients reach this session.

use chatsync_client::{StoreReply, StoreRequest};
use chatsync_proto::{UserDocument, UserId};
use tokio::sync::watch;

use crate::StoreError;

/// Document store consumed by the runtime.
///
/// Must be Clone (the runtime and tests hold handles to the same store), Send
/// + Sync, and synchronous. Implementations typically share internal state
/// via `Arc`, so clones see the same documents.
pub trait DurableStore: Clone + Send + Sync + 'static {
    /// Execute one request.
    ///
    /// Reads return the matching [`StoreReply`] variant; writes return
    /// [`StoreReply::Written`] with the request kind.
    fn execute(&self, request: &StoreRequest) -> Result<StoreReply, StoreError>;

    /// Subscribe to pushes of `users/{user_id}`.
    ///
    /// The receiver's current value is considered seen; only later writes
    /// wake it. `None` means the document does not exist (yet).
    fn subscribe_profile(&self, user_id: &UserId) -> watch::Receiver<Option<UserDocument>>;
}
