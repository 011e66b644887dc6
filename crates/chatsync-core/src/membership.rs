//! Membership view.
//!
//! The durable store pushes the user's room list as soon as someone adds
//! them to a room, but the locally cached list only changes on a full profile
//! refresh. The reconciler keeps both and exposes their union, so a freshly
//! added group is navigable before the refresh completes.
//!
//! Room metadata and participant display names are resolved lazily:
//! [`MembershipReconciler::missing_metadata`] lists rooms whose documents have
//! not been fetched yet, [`MembershipReconciler::take_unknown_counterparts`]
//! lists direct-room counterparts that are neither friends nor cached
//! contacts.
//!
//! # Invariants
//!
//! - The visible list is `cached ∪ pending`, cached first, no duplicates.
//! - A room id leaves the visible list only through [`remove`] (explicit
//!   leave or delete) or through a refresh / metadata fetch proving it no
//!   longer exists.
//!
//! [`remove`]: MembershipReconciler::remove

use std::collections::{BTreeSet, HashMap, HashSet};

use chatsync_proto::{RoomDocument, RoomId, RoomKind, UserId};

use crate::unread::UnreadLedger;

/// Resolved room entry for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Room id
    pub room_id: RoomId,
    /// Kind, `None` until metadata arrives
    pub kind: Option<RoomKind>,
    /// Participants
    pub participants: BTreeSet<UserId>,
    /// Group administrator
    pub admin_id: Option<UserId>,
    /// Group name or direct counterpart's name; empty while unresolved
    pub display_name: String,
    /// Unread count
    pub unread: u32,
    /// Known from a push but not yet confirmed by a refresh
    pub pending: bool,
}

/// Cached + pending membership with metadata and name caches.
#[derive(Debug, Clone)]
pub struct MembershipReconciler {
    self_id: UserId,
    cached: Vec<RoomId>,
    pending: Vec<RoomId>,
    rooms: HashMap<RoomId, RoomDocument>,
    friends: HashMap<UserId, String>,
    contacts: HashMap<UserId, String>,
    lookups_in_flight: HashSet<UserId>,
}

impl MembershipReconciler {
    /// Empty view for `self_id`.
    pub fn new(self_id: UserId) -> Self {
        Self {
            self_id,
            cached: Vec::new(),
            pending: Vec::new(),
            rooms: HashMap::new(),
            friends: HashMap::new(),
            contacts: HashMap::new(),
            lookups_in_flight: HashSet::new(),
        }
    }

    /// Room ids from the locally cached profile.
    pub fn cached(&self) -> &[RoomId] {
        &self.cached
    }

    /// Room ids known only from pushes.
    pub fn pending(&self) -> &[RoomId] {
        &self.pending
    }

    /// True if the room is visible.
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.cached.contains(room_id) || self.pending.contains(room_id)
    }

    /// True if the room is visible only because of a push.
    pub fn is_pending(&self, room_id: &RoomId) -> bool {
        self.pending.contains(room_id)
    }

    /// Union view: cached rooms, then pending rooms.
    pub fn visible_room_ids(&self) -> Vec<RoomId> {
        self.cached.iter().chain(self.pending.iter()).cloned().collect()
    }

    /// Fetched metadata for a room.
    pub fn room(&self, room_id: &RoomId) -> Option<&RoomDocument> {
        self.rooms.get(room_id)
    }

    /// A push delivered the user's current room list. Ids not yet known
    /// become pending. Returns the newly pending ids.
    pub fn observe_push(&mut self, chat_rooms: &[RoomId]) -> Vec<RoomId> {
        let mut added = Vec::new();
        for room_id in chat_rooms {
            if !self.contains(room_id) {
                self.pending.push(room_id.clone());
                added.push(room_id.clone());
            }
        }
        if !added.is_empty() {
            tracing::debug!(count = added.len(), "pending rooms observed");
        }
        added
    }

    /// A full profile refresh replaced the cached list.
    ///
    /// Pending rooms listed in the refresh are promoted; pending and cached
    /// rooms missing from it are dropped. Returns the dropped ids.
    pub fn refresh(&mut self, chat_rooms: &[RoomId]) -> Vec<RoomId> {
        let mut next: Vec<RoomId> = Vec::with_capacity(chat_rooms.len());
        for room_id in chat_rooms {
            if !next.contains(room_id) {
                next.push(room_id.clone());
            }
        }

        let dropped: Vec<RoomId> =
            self.visible_room_ids().into_iter().filter(|id| !next.contains(id)).collect();
        for room_id in &dropped {
            self.rooms.remove(room_id);
        }

        self.cached = next;
        self.pending.clear();
        if !dropped.is_empty() {
            tracing::debug!(count = dropped.len(), "rooms dropped by refresh");
        }
        dropped
    }

    /// Visible rooms without fetched metadata.
    pub fn missing_metadata(&self) -> Vec<RoomId> {
        self.cached
            .iter()
            .chain(self.pending.iter())
            .filter(|id| !self.rooms.contains_key(*id))
            .cloned()
            .collect()
    }

    /// Apply a metadata fetch for `requested`.
    ///
    /// Documents for rooms that are no longer visible are ignored. A pending
    /// room the store has no document for does not exist and is dropped.
    /// Returns the dropped ids.
    pub fn apply_rooms(&mut self, requested: &[RoomId], docs: Vec<RoomDocument>) -> Vec<RoomId> {
        let mut found: HashSet<RoomId> = HashSet::with_capacity(docs.len());
        for doc in docs {
            if self.contains(&doc.room_id) {
                found.insert(doc.room_id.clone());
                self.rooms.insert(doc.room_id.clone(), doc);
            } else {
                tracing::debug!(room_id = %doc.room_id, "metadata for room no longer visible ignored");
            }
        }

        let dropped: Vec<RoomId> = requested
            .iter()
            .filter(|id| self.is_pending(id) && !found.contains(*id))
            .cloned()
            .collect();
        self.pending.retain(|id| !dropped.contains(id));
        dropped
    }

    /// The local user created or ensured a room. It becomes a cached room
    /// with known metadata.
    pub fn insert_local(&mut self, doc: RoomDocument) {
        let room_id = doc.room_id.clone();
        self.pending.retain(|id| *id != room_id);
        if !self.cached.contains(&room_id) {
            self.cached.push(room_id.clone());
        }
        self.rooms.insert(room_id, doc);
    }

    /// Explicit leave or delete. Returns `false` if the room was not visible.
    pub fn remove(&mut self, room_id: &RoomId) -> bool {
        let was_visible = self.contains(room_id);
        self.cached.retain(|id| id != room_id);
        self.pending.retain(|id| id != room_id);
        self.rooms.remove(room_id);
        was_visible
    }

    /// Replace the friends cache.
    pub fn set_friends(&mut self, friends: impl IntoIterator<Item = (UserId, String)>) {
        self.friends = friends.into_iter().collect();
    }

    /// Known friend names.
    pub fn friends(&self) -> &HashMap<UserId, String> {
        &self.friends
    }

    /// Direct-room counterparts with no known name and no lookup in flight.
    /// The returned ids are marked in flight.
    pub fn take_unknown_counterparts(&mut self) -> Vec<UserId> {
        let mut unknown: Vec<UserId> = Vec::new();
        for room_id in self.cached.iter().chain(self.pending.iter()) {
            let Some(counterpart) = self.rooms.get(room_id).and_then(|r| r.counterpart(&self.self_id))
            else {
                continue;
            };
            if self.name_of(counterpart).is_none()
                && !self.lookups_in_flight.contains(counterpart)
                && !unknown.contains(counterpart)
            {
                unknown.push(counterpart.clone());
            }
        }
        self.lookups_in_flight.extend(unknown.iter().cloned());
        unknown
    }

    /// Result of a single-user lookup. `None` means the user does not exist.
    pub fn apply_contact(&mut self, user_id: UserId, username: Option<String>) {
        self.lookups_in_flight.remove(&user_id);
        if let Some(username) = username {
            self.contacts.insert(user_id, username);
        }
    }

    /// A lookup failed; allow it to be retried.
    pub fn lookup_failed(&mut self, user_id: &UserId) {
        self.lookups_in_flight.remove(user_id);
    }

    fn name_of(&self, user_id: &UserId) -> Option<&str> {
        self.friends.get(user_id).or_else(|| self.contacts.get(user_id)).map(String::as_str)
    }

    /// Group name, or the direct counterpart's friend or contact name.
    pub fn display_name(&self, room_id: &RoomId) -> Option<String> {
        let doc = self.rooms.get(room_id)?;
        match doc.kind {
            RoomKind::Group => doc.group_name.clone(),
            RoomKind::Direct => {
                doc.counterpart(&self.self_id).and_then(|id| self.name_of(id)).map(str::to_owned)
            },
        }
    }

    /// Resolved view of every visible room, in membership order.
    pub fn view(&self, unread: &UnreadLedger) -> Vec<Room> {
        self.cached
            .iter()
            .chain(self.pending.iter())
            .map(|room_id| {
                let doc = self.rooms.get(room_id);
                Room {
                    room_id: room_id.clone(),
                    kind: doc.map(|d| d.kind),
                    participants: doc
                        .map(|d| d.participants.iter().cloned().collect())
                        .unwrap_or_default(),
                    admin_id: doc.filter(|d| d.kind == RoomKind::Group).map(|d| d.admin_id.clone()),
                    display_name: self.display_name(room_id).unwrap_or_default(),
                    unread: unread.get(room_id),
                    pending: self.is_pending(room_id),
                }
            })
            .collect()
    }
}
