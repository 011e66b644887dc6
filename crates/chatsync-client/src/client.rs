//! Client state machine.
//!
//! The `Client` reconciles the two sources feeding a chat session: frames
//! from the ephemeral transport and documents from the durable store. It owns
//! one of each core state machine and routes every event to them:
//!
//! - transport frames for the active room go to the [`RoomSession`], message
//!   frames for other rooms go to the [`UnreadLedger`]
//! - profile pushes go to the [`MembershipReconciler`] and the unread ledger
//! - keystrokes and ticks go to the [`TypingDebouncer`]
//!
//! Store reads and writes are returned as [`StoreRequest`] actions; their
//! results come back as events and are applied only if they still match the
//! current state (see [`Generation`]).

use std::collections::HashSet;

use chatsync_core::{
    ConnectionManager, Environment, Generation, Message, MembershipReconciler, Room,
    RoomSession, SessionState, SyncConfig, SyncError, TypingDebouncer, TypingSignal,
    TypingUser, UnreadLedger,
};
use chatsync_proto::{
    Frame, FrameKind, RoomDocument, RoomId, RoomKind, StoredMessage, UserDocument, UserId,
};

use crate::{
    error::ClientError,
    event::{ClientAction, ClientEvent, NoticeLevel, StoreReply, StoreRequest},
};

/// Client identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Stable user id.
    pub user_id: UserId,
    /// Display name sent with every frame.
    pub username: String,
}

impl ClientIdentity {
    /// Create an identity.
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), username: username.into() }
    }
}

/// Chat synchronization engine.
pub struct Client<E: Environment> {
    /// Environment for clocks and randomness.
    env: E,

    /// Who we are.
    identity: ClientIdentity,

    /// Tunables.
    config: SyncConfig,

    /// Transport session and handler slot.
    connection: ConnectionManager,

    /// Active room, if any.
    active: Option<RoomSession>,

    /// Local typing flag for the active room.
    typing: TypingDebouncer<E::Instant>,

    /// Unread counters.
    unread: UnreadLedger,

    /// Cached ∪ pending membership.
    membership: MembershipReconciler,

    /// Unread keys present in the last durable profile, for stale purging.
    durable_unread_keys: Vec<RoomId>,

    /// Rooms left or deleted this session. Late messages for them are not
    /// counted until a profile lists them again.
    departed: HashSet<RoomId>,

    /// Last issued room activation.
    generation: Generation,

    /// `start()` ran.
    started: bool,

    /// `shutdown()` ran; every further event is ignored.
    shut_down: bool,
}

impl<E: Environment> Client<E> {
    /// Create a client. Nothing happens until [`Client::start`].
    pub fn new(env: E, identity: ClientIdentity, config: SyncConfig) -> Self {
        let membership = MembershipReconciler::new(identity.user_id.clone());
        let typing = TypingDebouncer::new(config.typing_idle_window);
        Self {
            env,
            identity,
            config,
            connection: ConnectionManager::new(),
            active: None,
            typing,
            unread: UnreadLedger::new(),
            membership,
            durable_unread_keys: Vec::new(),
            departed: HashSet::new(),
            generation: Generation::new(0),
            started: false,
            shut_down: false,
        }
    }

    /// Our user id.
    pub fn user_id(&self) -> &UserId {
        &self.identity.user_id
    }

    /// Our display name.
    pub fn username(&self) -> &str {
        &self.identity.username
    }

    /// Configuration in use.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Transport session state.
    pub fn session_state(&self) -> SessionState {
        self.connection.state()
    }

    /// Connection manager, for inspection.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Active room id.
    pub fn active_room(&self) -> Option<&RoomId> {
        self.active.as_ref().map(RoomSession::room_id)
    }

    /// Active room session.
    pub fn room_session(&self) -> Option<&RoomSession> {
        self.active.as_ref()
    }

    /// Messages of the active room, oldest first. Empty if no room is open.
    pub fn messages(&self) -> &[Message] {
        self.active.as_ref().map(RoomSession::messages).unwrap_or_default()
    }

    /// Remote user typing in the active room.
    pub fn typing_user(&self) -> Option<&TypingUser> {
        self.active.as_ref().and_then(RoomSession::typing_user)
    }

    /// Whether the local user is composing.
    pub fn is_typing(&self) -> bool {
        self.typing.is_typing()
    }

    /// Unread counters.
    pub fn unread(&self) -> &UnreadLedger {
        &self.unread
    }

    /// Membership view.
    pub fn membership(&self) -> &MembershipReconciler {
        &self.membership
    }

    /// Last issued room activation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True after [`Client::shutdown`].
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Resolved room list in membership order.
    pub fn room_list(&self) -> Vec<Room> {
        self.membership.view(&self.unread)
    }

    /// Open the transport and request the profile.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::Terminal` if the transport already failed
    pub fn start(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if self.shut_down {
            return Ok(Vec::new());
        }
        let mut actions = Vec::new();
        if let Some(action) = self.connection.connect()? {
            actions.push(ClientAction::Transport(action));
        }
        if !self.started {
            self.started = true;
            tracing::info!(user_id = %self.identity.user_id, "session starting");
            actions.push(self.fetch_profile());
        }
        Ok(actions)
    }

    /// Tear the session down: stop typing, release the room handler, close
    /// the transport. Idempotent.
    pub fn shutdown(&mut self) -> Vec<ClientAction> {
        if self.shut_down {
            return Vec::new();
        }
        let mut actions = Vec::new();
        self.deactivate(&mut actions);
        if let Some(action) = self.connection.close() {
            actions.push(ClientAction::Transport(action));
        }
        self.shut_down = true;
        tracing::info!(user_id = %self.identity.user_id, "session shut down");
        actions
    }

    /// Process an event and return resulting actions.
    pub fn handle(
        &mut self,
        event: ClientEvent<E::Instant>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        if self.shut_down {
            tracing::trace!("event after shutdown ignored");
            return Ok(Vec::new());
        }
        match event {
            ClientEvent::Connect => self.start(),
            ClientEvent::TransportOpened => Ok(self.handle_transport_opened()),
            ClientEvent::TransportFailed { reason } => Ok(self.handle_transport_failed(reason)),
            ClientEvent::FrameReceived(raw) => Ok(self.handle_frame(&raw)),
            ClientEvent::Tick { now } => Ok(self.handle_tick(now)),
            ClientEvent::OpenRoom { room_id } => self.handle_open_room(room_id),
            ClientEvent::OpenDirect { counterpart } => self.handle_open_direct(counterpart),
            ClientEvent::CreateGroup { name, members } => self.handle_create_group(&name, members),
            ClientEvent::CloseRoom => {
                let mut actions = Vec::new();
                self.deactivate(&mut actions);
                Ok(actions)
            },
            ClientEvent::Keystroke { now } => self.handle_keystroke(now),
            ClientEvent::SendMessage { text } => self.handle_send_message(&text),
            ClientEvent::LeaveRoom { room_id } => self.handle_leave_room(room_id),
            ClientEvent::DeleteRoom { room_id } => self.handle_delete_room(room_id),
            ClientEvent::ProfilePushed(doc) => Ok(self.handle_profile_pushed(&doc)),
            ClientEvent::StoreCompleted(reply) => Ok(self.handle_store_reply(reply)),
            ClientEvent::StoreFailed { request, reason } => {
                Ok(self.handle_store_failed(request, &reason))
            },
            ClientEvent::Shutdown => Ok(self.shutdown()),
        }
    }

    fn handle_transport_opened(&mut self) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        if let Some(action) = self.connection.opened() {
            actions.push(ClientAction::Transport(action));
        }
        // Rooms opened before the transport came up announce themselves now.
        if let Some(room_id) = self.active_room().cloned() {
            self.send_join(&room_id, &mut actions);
        }
        actions
    }

    fn handle_transport_failed(&mut self, reason: String) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        if let Some(action) = self.connection.failed(reason) {
            actions.push(ClientAction::Transport(action));
            // Nothing can be sent any more; drop the local flag silently.
            self.typing.reset();
            actions.push(ClientAction::Notice {
                level: NoticeLevel::Error,
                message: "Cannot reach the chat server. Restart the session to reconnect."
                    .to_string(),
            });
        }
        actions
    }

    fn handle_frame(&mut self, raw: &str) -> Vec<ClientAction> {
        let delivery = match self.connection.deliver(raw) {
            Ok(Some(delivery)) => delivery,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, kind = err.kind(), "malformed frame dropped");
                return Vec::new();
            },
        };

        let frame = delivery.frame;
        let Some(session) = self.active.as_mut() else {
            return Vec::new();
        };
        if session.subscription() != delivery.token {
            tracing::debug!(token = delivery.token.value(), "frame for retired handler dropped");
            return Vec::new();
        }

        let for_active = *session.room_id() == frame.room_id;
        let from_self = frame.user_id == self.identity.user_id;

        match frame.kind {
            FrameKind::Message if for_active => {
                let arrived_at = self.env.wall_clock();
                if let Some(message) =
                    Message::from_frame(&frame, arrived_at, self.config.display_offset)
                {
                    let outcome = session.push_live(message);
                    tracing::trace!(room_id = %frame.room_id, ?outcome, "live message");
                }
            },
            FrameKind::Message if self.departed.contains(&frame.room_id) => {
                tracing::debug!(room_id = %frame.room_id, "message for departed room ignored");
            },
            FrameKind::Message => {
                let count = self.unread.increment(&frame.room_id, Some(session.room_id()));
                tracing::debug!(room_id = %frame.room_id, count, "unread incremented");
            },
            FrameKind::Typing if for_active && !from_self => {
                session.remote_typing(frame.user_id, frame.username);
            },
            FrameKind::StopTyping if for_active && !from_self => {
                session.remote_stop_typing();
            },
            FrameKind::Join => {
                tracing::debug!(room_id = %frame.room_id, user_id = %frame.user_id, "peer joined");
            },
            FrameKind::Typing | FrameKind::StopTyping => {},
        }
        Vec::new()
    }

    fn handle_tick(&mut self, now: E::Instant) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        if self.typing.tick(now) == Some(TypingSignal::Stop) {
            if let Some(room_id) = self.active_room().cloned() {
                self.send_typing_signal(TypingSignal::Stop, &room_id, &mut actions);
            }
        }
        actions
    }

    fn handle_open_room(&mut self, room_id: RoomId) -> Result<Vec<ClientAction>, ClientError> {
        if !self.is_openable(&room_id) {
            return Err(SyncError::UnknownRoom(room_id).into());
        }
        let mut actions = Vec::new();
        self.open_room(room_id, &mut actions);
        Ok(actions)
    }

    fn handle_open_direct(
        &mut self,
        counterpart: UserId,
    ) -> Result<Vec<ClientAction>, ClientError> {
        if counterpart == self.identity.user_id {
            return Err(ClientError::SelfDirect);
        }
        let room_id = RoomId::direct(&self.identity.user_id, &counterpart);
        let mut actions = Vec::new();

        if self.membership.room(&room_id).is_none() {
            let doc =
                RoomDocument::direct(&self.identity.user_id, &counterpart, self.env.wall_clock());
            self.membership.insert_local(doc.clone());
            actions.push(ClientAction::Store(StoreRequest::EnsureRoom(doc)));
        }

        self.open_room(room_id, &mut actions);
        Ok(actions)
    }

    fn handle_create_group(
        &mut self,
        name: &str,
        members: Vec<UserId>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::EmptyGroupName);
        }

        let room_id = self.env.random_room_id();
        let doc = RoomDocument::group(
            room_id.clone(),
            name,
            &self.identity.user_id,
            members,
            self.env.wall_clock(),
        );
        tracing::info!(%room_id, participants = doc.participants.len(), "group created");

        self.membership.insert_local(doc.clone());
        let mut actions = vec![ClientAction::Store(StoreRequest::EnsureRoom(doc))];
        self.open_room(room_id, &mut actions);
        actions.push(ClientAction::Notice {
            level: NoticeLevel::Info,
            message: format!("Group '{name}' created!"),
        });
        Ok(actions)
    }

    fn handle_keystroke(&mut self, now: E::Instant) -> Result<Vec<ClientAction>, ClientError> {
        let room_id = self.active_room().cloned().ok_or(SyncError::NoActiveRoom)?;
        let mut actions = Vec::new();
        if let Some(signal) = self.typing.keystroke(now) {
            self.send_typing_signal(signal, &room_id, &mut actions);
        }
        Ok(actions)
    }

    fn handle_send_message(&mut self, text: &str) -> Result<Vec<ClientAction>, ClientError> {
        let room_id = self.active_room().cloned().ok_or(SyncError::NoActiveRoom)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SyncError::EmptyMessage.into());
        }

        let sent_at = self.env.wall_clock();
        let frame = Frame::message(
            self.identity.user_id.clone(),
            self.identity.username.clone(),
            room_id.clone(),
            text,
            sent_at,
        );

        let mut actions = Vec::new();
        self.transmit(&frame, &mut actions);
        let signal = self.typing.message_sent();
        self.send_typing_signal(signal, &room_id, &mut actions);

        if let Some(stored) = StoredMessage::from_frame(&frame, sent_at) {
            actions.push(ClientAction::Store(StoreRequest::PersistMessage(stored)));
        }
        Ok(actions)
    }

    fn handle_leave_room(&mut self, room_id: RoomId) -> Result<Vec<ClientAction>, ClientError> {
        let doc = self
            .membership
            .room(&room_id)
            .ok_or_else(|| SyncError::UnknownRoom(room_id.clone()))?;
        if doc.kind != RoomKind::Group || self.config.default_room.as_ref() == Some(&room_id) {
            return Err(SyncError::NotLeavable(room_id).into());
        }
        let mut actions = vec![ClientAction::Store(StoreRequest::LeaveRoom {
            user_id: self.identity.user_id.clone(),
            room_id: room_id.clone(),
            fallback: self.config.default_room.clone(),
        })];

        let announcement = Frame::message(
            UserId::system(),
            self.identity.username.clone(),
            room_id.clone(),
            format!("{} has left the chat.", self.identity.username),
            self.env.wall_clock(),
        );
        self.transmit(&announcement, &mut actions);
        if let Some(stored) = StoredMessage::from_frame(&announcement, self.env.wall_clock()) {
            actions.push(ClientAction::Store(StoreRequest::PersistMessage(stored)));
        }

        self.remove_room_locally(&room_id, &mut actions);
        actions.push(ClientAction::Notice {
            level: NoticeLevel::Info,
            message: "You have left the room!".to_string(),
        });
        tracing::info!(%room_id, "left room");
        Ok(actions)
    }

    fn handle_delete_room(&mut self, room_id: RoomId) -> Result<Vec<ClientAction>, ClientError> {
        let doc = self
            .membership
            .room(&room_id)
            .ok_or_else(|| SyncError::UnknownRoom(room_id.clone()))?;
        if doc.kind != RoomKind::Group || doc.admin_id != self.identity.user_id {
            return Err(SyncError::NotAdmin(room_id).into());
        }

        let mut actions = vec![ClientAction::Store(StoreRequest::DeleteRoom {
            room_id: room_id.clone(),
            participants: doc.participants.clone(),
            fallback: self.config.default_room.clone(),
        })];
        self.remove_room_locally(&room_id, &mut actions);
        actions.push(ClientAction::Notice {
            level: NoticeLevel::Info,
            message: "Room deleted!".to_string(),
        });
        tracing::info!(%room_id, "deleted room");
        Ok(actions)
    }

    fn handle_profile_pushed(&mut self, doc: &UserDocument) -> Vec<ClientAction> {
        self.departed.retain(|id| !doc.chat_rooms.contains(id));
        let added = self.membership.observe_push(&doc.chat_rooms);

        let active = self.active_room().cloned();
        self.unread.apply_snapshot(&doc.unread_messages, active.as_ref());
        let departed = &self.departed;
        self.unread.retain_rooms(|id| !departed.contains(id));
        self.durable_unread_keys = doc.unread_messages.keys().cloned().collect();

        if added.is_empty() {
            Vec::new()
        } else {
            vec![ClientAction::Store(StoreRequest::FetchRooms { room_ids: added })]
        }
    }

    fn handle_profile_refreshed(&mut self, doc: UserDocument) -> Vec<ClientAction> {
        let mut actions = Vec::new();

        self.departed.retain(|id| !doc.chat_rooms.contains(id));
        let dropped = self.membership.refresh(&doc.chat_rooms);
        for room_id in &dropped {
            tracing::info!(%room_id, "room no longer in profile");
            self.purge_room(room_id, &mut actions);
        }

        let active = self.active_room().cloned();
        self.unread.apply_snapshot(&doc.unread_messages, active.as_ref());
        self.durable_unread_keys = doc.unread_messages.keys().cloned().collect();

        // The refreshed profile is the whole membership.
        let membership = &self.membership;
        let default_room = self.config.default_room.as_ref();
        let purged =
            self.unread.retain_rooms(|id| membership.contains(id) || default_room == Some(id));
        if !purged.is_empty() {
            tracing::debug!(?purged, "unread for non-member rooms purged");
        }

        let missing = self.membership.missing_metadata();
        if !missing.is_empty() {
            actions.push(ClientAction::Store(StoreRequest::FetchRooms { room_ids: missing }));
        }
        if !doc.friends.is_empty() {
            actions.push(ClientAction::Store(StoreRequest::FetchFriends {
                user_ids: doc.friends.clone(),
            }));
        }

        if self.active.is_none() {
            let reopen = doc
                .last_opened_chat_room
                .filter(|id| self.is_openable(id))
                .or_else(|| self.config.default_room.clone());
            if let Some(room_id) = reopen {
                self.open_room(room_id, &mut actions);
            }
        }
        actions
    }

    fn handle_store_reply(&mut self, reply: StoreReply) -> Vec<ClientAction> {
        match reply {
            StoreReply::Profile(doc) => self.handle_profile_refreshed(doc),
            StoreReply::Rooms { requested, rooms } => {
                let mut actions = Vec::new();
                for room_id in self.membership.apply_rooms(&requested, rooms) {
                    tracing::debug!(%room_id, "pending room does not exist");
                    self.purge_room(&room_id, &mut actions);
                }
                for user_id in self.membership.take_unknown_counterparts() {
                    actions.push(ClientAction::Store(StoreRequest::FetchUser { user_id }));
                }
                actions
            },
            StoreReply::Friends(friends) => {
                self.membership.set_friends(friends);
                Vec::new()
            },
            StoreReply::User { user_id, username } => {
                self.membership.apply_contact(user_id, username);
                Vec::new()
            },
            StoreReply::History { room_id, generation, messages } => {
                self.apply_history(&room_id, generation, messages);
                Vec::new()
            },
            StoreReply::Written(kind) => {
                tracing::trace!(?kind, "write acknowledged");
                if kind.changes_membership() { vec![self.fetch_profile()] } else { Vec::new() }
            },
        }
    }

    fn handle_store_failed(&mut self, request: StoreRequest, reason: &str) -> Vec<ClientAction> {
        let kind = request.kind();
        tracing::warn!(?kind, %reason, "store request failed");

        let message = match request {
            StoreRequest::LoadHistory { room_id, generation, .. } => {
                // Go live without history so buffered and future frames show.
                if !self.apply_history(&room_id, generation, Vec::new()) {
                    return Vec::new();
                }
                "Could not load earlier messages."
            },
            StoreRequest::FetchUser { user_id } => {
                self.membership.lookup_failed(&user_id);
                return Vec::new();
            },
            StoreRequest::FetchRooms { .. } | StoreRequest::FetchFriends { .. } => {
                return Vec::new();
            },
            StoreRequest::FetchProfile { .. } => "Could not load your profile.",
            StoreRequest::PersistMessage(_) => "Message could not be saved.",
            StoreRequest::MarkOpened { .. } => return Vec::new(),
            StoreRequest::EnsureRoom(_) => "Could not create the room. Try again later.",
            StoreRequest::LeaveRoom { .. } => "Failed to leave room. Try again later.",
            StoreRequest::DeleteRoom { .. } => "Failed to delete room. Try again later.",
        };
        vec![ClientAction::Notice { level: NoticeLevel::Error, message: message.to_string() }]
    }

    /// Apply a history result. Returns `false` if it was stale and discarded.
    fn apply_history(
        &mut self,
        room_id: &RoomId,
        generation: Generation,
        messages: Vec<StoredMessage>,
    ) -> bool {
        let now = self.env.wall_clock();
        let offset = self.config.display_offset;
        let Some(session) = self.active.as_mut() else {
            tracing::debug!(%room_id, %generation, "history for closed room discarded");
            return false;
        };
        match session.apply_history(generation, messages, now, offset) {
            Ok(len) => {
                tracing::debug!(%room_id, %generation, len, "room live");
                true
            },
            Err(err) => {
                tracing::debug!(%room_id, error = %err, "stale history discarded");
                false
            },
        }
    }

    fn is_openable(&self, room_id: &RoomId) -> bool {
        self.membership.contains(room_id) || self.config.default_room.as_ref() == Some(room_id)
    }

    /// Activate `room_id`: new generation, new handler, history load, unread
    /// clear, join announcement.
    fn open_room(&mut self, room_id: RoomId, actions: &mut Vec<ClientAction>) {
        if self.active_room() == Some(&room_id) {
            self.unread.clear(&room_id);
            return;
        }
        self.deactivate(actions);

        self.generation = self.generation.next();
        let token = self.connection.subscribe();
        self.active =
            Some(RoomSession::new(room_id.clone(), self.generation, token, self.config.history_limit));
        self.unread.clear(&room_id);
        self.departed.remove(&room_id);
        tracing::info!(%room_id, generation = %self.generation, "room opened");

        actions.push(ClientAction::Store(StoreRequest::LoadHistory {
            room_id: room_id.clone(),
            generation: self.generation,
            limit: self.config.history_limit,
        }));

        let purge: Vec<RoomId> = self
            .durable_unread_keys
            .iter()
            .filter(|id| **id != room_id && !self.membership.contains(id))
            .cloned()
            .collect();
        self.durable_unread_keys.retain(|id| *id != room_id && !purge.contains(id));
        actions.push(ClientAction::Store(StoreRequest::MarkOpened {
            user_id: self.identity.user_id.clone(),
            room_id: room_id.clone(),
            purge,
        }));

        self.send_join(&room_id, actions);
    }

    /// Release the active room: stop typing, release the handler.
    fn deactivate(&mut self, actions: &mut Vec<ClientAction>) {
        let Some(session) = self.active.take() else {
            return;
        };
        if let Some(signal) = self.typing.reset() {
            self.send_typing_signal(signal, session.room_id(), actions);
        }
        self.connection.unsubscribe(session.subscription());
        tracing::debug!(room_id = %session.room_id(), generation = %session.generation(), "room closed");
    }

    /// Local side of leave/delete: unread purge, membership removal, fallback.
    fn remove_room_locally(&mut self, room_id: &RoomId, actions: &mut Vec<ClientAction>) {
        self.membership.remove(room_id);
        self.purge_room(room_id, actions);
    }

    /// Forget a room that is no longer ours. If it was open, fall back to the
    /// default room.
    fn purge_room(&mut self, room_id: &RoomId, actions: &mut Vec<ClientAction>) {
        self.departed.insert(room_id.clone());
        self.unread.clear(room_id);
        self.durable_unread_keys.retain(|id| id != room_id);
        if self.active_room() == Some(room_id) {
            self.deactivate(actions);
            if let Some(fallback) = self.config.default_room.clone() {
                if fallback != *room_id {
                    self.open_room(fallback, actions);
                }
            }
        }
    }

    fn fetch_profile(&self) -> ClientAction {
        ClientAction::Store(StoreRequest::FetchProfile { user_id: self.identity.user_id.clone() })
    }

    fn send_join(&self, room_id: &RoomId, actions: &mut Vec<ClientAction>) {
        if !self.connection.is_connected() {
            return;
        }
        let frame = Frame::join(
            self.identity.user_id.clone(),
            self.identity.username.clone(),
            room_id.clone(),
        );
        self.transmit(&frame, actions);
    }

    fn send_typing_signal(
        &self,
        signal: TypingSignal,
        room_id: &RoomId,
        actions: &mut Vec<ClientAction>,
    ) {
        let user_id = self.identity.user_id.clone();
        let username = self.identity.username.clone();
        let frame = match signal {
            TypingSignal::Start => Frame::typing(user_id, username, room_id.clone()),
            TypingSignal::Stop => Frame::stop_typing(user_id, username, room_id.clone()),
        };
        self.transmit(&frame, actions);
    }

    /// Send a frame if connected. A dropped frame is logged by the connection
    /// manager and never retried.
    fn transmit(&self, frame: &Frame, actions: &mut Vec<ClientAction>) {
        match self.connection.send(frame) {
            Ok(action) => actions.push(ClientAction::Transport(action)),
            Err(err) => tracing::debug!(error = %err, transient = err.is_transient(), "frame not sent"),
        }
    }
}
