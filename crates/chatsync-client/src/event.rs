//! Client events and actions.

use chatsync_core::{ConnectionAction, Generation};
use chatsync_proto::{RoomDocument, RoomId, StoredMessage, UserDocument, UserId};

/// Events the caller feeds into the client.
///
/// Two independent sources produce events: the transport (frames, open,
/// failure) and the durable store (pushes, request completions). The caller
/// also forwards user intents and drives time with ticks.
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and simulated time.
#[derive(Debug, Clone)]
pub enum ClientEvent<I = std::time::Instant> {
    /// Start the session: open the transport and load the profile.
    Connect,

    /// The transport finished opening.
    TransportOpened,

    /// The transport failed or the peer closed it.
    TransportFailed {
        /// Failure description
        reason: String,
    },

    /// Text frame received from the transport.
    FrameReceived(String),

    /// Time tick for typing expiry.
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// User selected a room.
    OpenRoom {
        /// Room to open
        room_id: RoomId,
    },

    /// User wants to message another user directly.
    OpenDirect {
        /// The other participant
        counterpart: UserId,
    },

    /// User creates a group with the given members.
    CreateGroup {
        /// Group name
        name: String,
        /// Members besides the creator
        members: Vec<UserId>,
    },

    /// User left the chat view without leaving any room.
    CloseRoom,

    /// Keystroke in the composer of the active room.
    Keystroke {
        /// Current time from the environment.
        now: I,
    },

    /// User sends a message to the active room.
    SendMessage {
        /// Body
        text: String,
    },

    /// User leaves a room.
    LeaveRoom {
        /// Room to leave
        room_id: RoomId,
    },

    /// Administrator deletes a group.
    DeleteRoom {
        /// Room to delete
        room_id: RoomId,
    },

    /// The durable store pushed the user's profile document.
    ProfilePushed(UserDocument),

    /// A store request completed.
    StoreCompleted(StoreReply),

    /// A store request failed.
    StoreFailed {
        /// The request that failed
        request: StoreRequest,
        /// Failure description
        reason: String,
    },

    /// Tear the session down.
    Shutdown,
}

/// Requests against the durable store, executed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRequest {
    /// Read `users/{user_id}`; reply with [`StoreReply::Profile`].
    FetchProfile {
        /// User
        user_id: UserId,
    },

    /// Read room documents; reply with [`StoreReply::Rooms`].
    FetchRooms {
        /// Rooms
        room_ids: Vec<RoomId>,
    },

    /// Read friend names; reply with [`StoreReply::Friends`].
    FetchFriends {
        /// Friend ids
        user_ids: Vec<UserId>,
    },

    /// Read one user's name; reply with [`StoreReply::User`].
    FetchUser {
        /// User
        user_id: UserId,
    },

    /// Read the most recent `limit` messages of a room; reply with
    /// [`StoreReply::History`].
    LoadHistory {
        /// Room
        room_id: RoomId,
        /// Activation the result belongs to
        generation: Generation,
        /// Window size
        limit: usize,
    },

    /// Append to `messages`.
    PersistMessage(StoredMessage),

    /// Set `lastOpenedChatRoom` and delete the unread counters of the opened
    /// room and of `purge`.
    MarkOpened {
        /// User
        user_id: UserId,
        /// Opened room
        room_id: RoomId,
        /// Stale counters of rooms the user is no longer in
        purge: Vec<RoomId>,
    },

    /// Create the room document unless it exists and add the room to every
    /// participant's room list.
    EnsureRoom(RoomDocument),

    /// Remove the user from the room's participants and the room from the
    /// user's list and unread map. `fallback` replaces `lastOpenedChatRoom`
    /// if it pointed at the room.
    LeaveRoom {
        /// User
        user_id: UserId,
        /// Room
        room_id: RoomId,
        /// Replacement last-opened room
        fallback: Option<RoomId>,
    },

    /// Delete the room document and remove the room from every participant.
    DeleteRoom {
        /// Room
        room_id: RoomId,
        /// Participants to update
        participants: Vec<UserId>,
        /// Replacement last-opened room
        fallback: Option<RoomId>,
    },
}

/// Request discriminant, used to acknowledge writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// [`StoreRequest::FetchProfile`]
    FetchProfile,
    /// [`StoreRequest::FetchRooms`]
    FetchRooms,
    /// [`StoreRequest::FetchFriends`]
    FetchFriends,
    /// [`StoreRequest::FetchUser`]
    FetchUser,
    /// [`StoreRequest::LoadHistory`]
    LoadHistory,
    /// [`StoreRequest::PersistMessage`]
    PersistMessage,
    /// [`StoreRequest::MarkOpened`]
    MarkOpened,
    /// [`StoreRequest::EnsureRoom`]
    EnsureRoom,
    /// [`StoreRequest::LeaveRoom`]
    LeaveRoom,
    /// [`StoreRequest::DeleteRoom`]
    DeleteRoom,
}

impl RequestKind {
    /// True for requests that change the durable store.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Self::PersistMessage
                | Self::MarkOpened
                | Self::EnsureRoom
                | Self::LeaveRoom
                | Self::DeleteRoom
        )
    }

    /// True for writes that change room membership.
    pub fn changes_membership(self) -> bool {
        matches!(self, Self::EnsureRoom | Self::LeaveRoom | Self::DeleteRoom)
    }
}

impl StoreRequest {
    /// Discriminant
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::FetchProfile { .. } => RequestKind::FetchProfile,
            Self::FetchRooms { .. } => RequestKind::FetchRooms,
            Self::FetchFriends { .. } => RequestKind::FetchFriends,
            Self::FetchUser { .. } => RequestKind::FetchUser,
            Self::LoadHistory { .. } => RequestKind::LoadHistory,
            Self::PersistMessage(_) => RequestKind::PersistMessage,
            Self::MarkOpened { .. } => RequestKind::MarkOpened,
            Self::EnsureRoom(_) => RequestKind::EnsureRoom,
            Self::LeaveRoom { .. } => RequestKind::LeaveRoom,
            Self::DeleteRoom { .. } => RequestKind::DeleteRoom,
        }
    }
}

/// Successful store replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreReply {
    /// Full profile read
    Profile(UserDocument),

    /// Room documents that exist among `requested`
    Rooms {
        /// Ids that were asked for
        requested: Vec<RoomId>,
        /// Documents found
        rooms: Vec<RoomDocument>,
    },

    /// Friend names
    Friends(Vec<(UserId, String)>),

    /// Single user lookup; `None` if the user does not exist
    User {
        /// User
        user_id: UserId,
        /// Name
        username: Option<String>,
    },

    /// History window
    History {
        /// Room
        room_id: RoomId,
        /// Activation the request was issued for
        generation: Generation,
        /// Messages in store order
        messages: Vec<StoredMessage>,
    },

    /// A write completed
    Written(RequestKind),
}

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Confirmation
    Info,
    /// Failure
    Error,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Transport I/O.
    Transport(ConnectionAction),

    /// Durable-store request. The caller feeds the outcome back as
    /// [`ClientEvent::StoreCompleted`] or [`ClientEvent::StoreFailed`].
    Store(StoreRequest),

    /// User-visible notice.
    Notice {
        /// Severity
        level: NoticeLevel,
        /// Text
        message: String,
    },
}
