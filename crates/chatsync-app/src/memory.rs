//! In-memory durable store for tests, simulation and offline use.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chatsync_client::{RequestKind, StoreReply, StoreRequest};
use chatsync_proto::{RoomDocument, RoomId, StoredMessage, UserDocument, UserId};
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::{DurableStore, StoreError};

/// Source of server timestamps.
pub type StoreClock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-memory [`DurableStore`].
///
/// Holds the three collections (`users`, `chatRooms`, `messages`) behind one
/// `Arc<Mutex<_>>`, so clones share state. Every write that touches a user
/// document republishes it to that user's profile subscribers.
///
/// Persisted messages are stamped with the store's clock, not the sender's
/// timestamp. The clock is the system clock unless one is injected with
/// [`MemoryStore::with_clock`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
    clock: Option<StoreClock>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: HashMap<UserId, UserDocument>,
    rooms: HashMap<RoomId, RoomDocument>,
    /// Append order.
    messages: Vec<StoredMessage>,
    next_message_id: u64,
    watchers: HashMap<UserId, watch::Sender<Option<UserDocument>>>,
}

impl MemoryStoreInner {
    fn publish(&self, user_id: &UserId) {
        if let Some(tx) = self.watchers.get(user_id) {
            tx.send_replace(self.users.get(user_id).cloned());
        }
    }

    /// Apply `update` to an existing user document and publish it.
    fn update_user(&mut self, user_id: &UserId, update: impl FnOnce(&mut UserDocument)) -> bool {
        let Some(doc) = self.users.get_mut(user_id) else {
            return false;
        };
        update(doc);
        self.publish(user_id);
        true
    }

    /// Drop `room_id` from a user's list and counters; repoint the last
    /// opened room at `fallback` if it was this room.
    fn detach_room(&mut self, user_id: &UserId, room_id: &RoomId, fallback: Option<&RoomId>) {
        self.update_user(user_id, |doc| {
            doc.chat_rooms.retain(|id| id != room_id);
            doc.unread_messages.remove(room_id);
            if doc.last_opened_chat_room.as_ref() == Some(room_id) {
                doc.last_opened_chat_room = fallback.cloned();
            }
        });
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp persisted messages from `clock`.
    #[must_use]
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Current server time.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.as_ref().map_or_else(Utc::now, |clock| clock())
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace a user document.
    pub fn put_user(&self, user_id: impl Into<UserId>, doc: UserDocument) {
        let user_id = user_id.into();
        let mut inner = self.lock();
        inner.users.insert(user_id.clone(), doc);
        inner.publish(&user_id);
    }

    /// Create or replace a room document. Does not touch user documents.
    pub fn put_room(&self, doc: RoomDocument) {
        self.lock().rooms.insert(doc.room_id.clone(), doc);
    }

    /// Current user document.
    pub fn user(&self, user_id: &UserId) -> Option<UserDocument> {
        self.lock().users.get(user_id).cloned()
    }

    /// Current room document.
    pub fn room(&self, room_id: &RoomId) -> Option<RoomDocument> {
        self.lock().rooms.get(room_id).cloned()
    }

    /// Persisted messages of a room in append order.
    pub fn messages(&self, room_id: &RoomId) -> Vec<StoredMessage> {
        self.lock().messages.iter().filter(|m| m.room_id == *room_id).cloned().collect()
    }

    /// Total persisted messages.
    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    /// Append a message as if another client persisted it.
    pub fn append_message(&self, message: StoredMessage) {
        let mut inner = self.lock();
        inner.next_message_id += 1;
        let id = format!("m{}", inner.next_message_id);
        inner.messages.push(StoredMessage { id: Some(id), ..message });
    }

    /// Increment a user's durable unread counter, the way the chat server
    /// does for recipients who are not looking at the room.
    pub fn bump_unread(&self, user_id: &UserId, room_id: &RoomId) -> bool {
        self.lock().update_user(user_id, |doc| {
            *doc.unread_messages.entry(room_id.clone()).or_insert(0) += 1;
        })
    }

    fn history(&self, room_id: &RoomId, limit: usize) -> Vec<StoredMessage> {
        let mut messages = self.messages(room_id);
        messages.sort_by_key(|m| m.timestamp);
        let skip = messages.len().saturating_sub(limit);
        messages.split_off(skip)
    }
}

impl DurableStore for MemoryStore {
    fn execute(&self, request: &StoreRequest) -> Result<StoreReply, StoreError> {
        match request {
            StoreRequest::FetchProfile { user_id } => self
                .user(user_id)
                .map(StoreReply::Profile)
                .ok_or_else(|| StoreError::NotFound(format!("users/{user_id}"))),

            StoreRequest::FetchRooms { room_ids } => {
                let inner = self.lock();
                let rooms = room_ids.iter().filter_map(|id| inner.rooms.get(id).cloned()).collect();
                Ok(StoreReply::Rooms { requested: room_ids.clone(), rooms })
            },

            StoreRequest::FetchFriends { user_ids } => {
                let inner = self.lock();
                let friends = user_ids
                    .iter()
                    .filter_map(|id| inner.users.get(id).map(|doc| (id.clone(), doc.username.clone())))
                    .collect();
                Ok(StoreReply::Friends(friends))
            },

            StoreRequest::FetchUser { user_id } => Ok(StoreReply::User {
                user_id: user_id.clone(),
                username: self.user(user_id).map(|doc| doc.username),
            }),

            StoreRequest::LoadHistory { room_id, generation, limit } => Ok(StoreReply::History {
                room_id: room_id.clone(),
                generation: *generation,
                messages: self.history(room_id, *limit),
            }),

            StoreRequest::PersistMessage(message) => {
                self.append_message(StoredMessage { timestamp: self.now(), ..message.clone() });
                Ok(StoreReply::Written(RequestKind::PersistMessage))
            },

            StoreRequest::MarkOpened { user_id, room_id, purge } => {
                let found = self.lock().update_user(user_id, |doc| {
                    doc.last_opened_chat_room = Some(room_id.clone());
                    doc.unread_messages.remove(room_id);
                    for stale in purge {
                        doc.unread_messages.remove(stale);
                    }
                });
                if found {
                    Ok(StoreReply::Written(RequestKind::MarkOpened))
                } else {
                    Err(StoreError::NotFound(format!("users/{user_id}")))
                }
            },

            StoreRequest::EnsureRoom(doc) => {
                let mut inner = self.lock();
                if inner.rooms.contains_key(&doc.room_id) {
                    tracing::debug!(room_id = %doc.room_id, "room already exists");
                    return Ok(StoreReply::Written(RequestKind::EnsureRoom));
                }
                inner.rooms.insert(doc.room_id.clone(), doc.clone());
                for participant in &doc.participants {
                    inner.update_user(participant, |user| {
                        if !user.chat_rooms.contains(&doc.room_id) {
                            user.chat_rooms.push(doc.room_id.clone());
                        }
                    });
                }
                Ok(StoreReply::Written(RequestKind::EnsureRoom))
            },

            StoreRequest::LeaveRoom { user_id, room_id, fallback } => {
                let mut inner = self.lock();
                if let Some(room) = inner.rooms.get_mut(room_id) {
                    room.participants.retain(|id| id != user_id);
                }
                inner.detach_room(user_id, room_id, fallback.as_ref());
                Ok(StoreReply::Written(RequestKind::LeaveRoom))
            },

            StoreRequest::DeleteRoom { room_id, participants, fallback } => {
                let mut inner = self.lock();
                inner.rooms.remove(room_id);
                for participant in participants {
                    inner.detach_room(participant, room_id, fallback.as_ref());
                }
                Ok(StoreReply::Written(RequestKind::DeleteRoom))
            },
        }
    }

    fn subscribe_profile(&self, user_id: &UserId) -> watch::Receiver<Option<UserDocument>> {
        let mut inner = self.lock();
        let current = inner.users.get(user_id).cloned();
        inner.watchers.entry(user_id.clone()).or_insert_with(|| watch::channel(current).0).subscribe()
    }
}
