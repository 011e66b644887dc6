//! Fuzz target for the Client state machine
//!
//! Feeds arbitrary interleavings of transport frames, store replies, user
//! intents and time to one client.
//!
//! # Invariants
//!
//! - `handle` never panics; rejected events return an error
//! - The active room never has an unread count
//! - Loaded messages all belong to the active room
//! - Errored is terminal

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use chatsync_client::{Client, ClientEvent, ClientIdentity, SessionState, StoreReply, SyncConfig};
use chatsync_core::Generation;
use chatsync_harness::SimEnv;
use chatsync_proto::{RoomDocument, RoomId, StoredMessage, UserDocument, UserId};
use libfuzzer_sys::fuzz_target;

const ROOMS: [&str; 4] = ["general", "g0", "g1", "ghost"];

fn room(index: u8) -> RoomId {
    RoomId::from(ROOMS[index as usize % ROOMS.len()])
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Connect,
    Opened,
    Failed,
    RawFrame(String),
    Open(u8),
    Close,
    Keystroke,
    Send(String),
    Leave(u8),
    Delete(u8),
    Advance(u16),
    Profile { rooms: Vec<u8>, unread: Vec<(u8, u8)>, push: bool },
    History { room: u8, generation: u8, texts: Vec<String> },
    Rooms(Vec<u8>),
    Shutdown,
}

fn profile(rooms: &[u8], unread: &[(u8, u8)]) -> UserDocument {
    UserDocument {
        username: "Me".to_string(),
        chat_rooms: rooms.iter().copied().map(room).collect(),
        unread_messages: unread.iter().map(|&(r, n)| (room(r), u32::from(n))).collect(),
        last_opened_chat_room: rooms.first().copied().map(room),
        ..UserDocument::default()
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let env = SimEnv::with_seed(0);
    let mut client = Client::new(env.clone(), ClientIdentity::new("me", "Me"), SyncConfig::default());
    let mut errored = false;

    for op in ops {
        let event = match op {
            Op::Connect => ClientEvent::Connect,
            Op::Opened => ClientEvent::TransportOpened,
            Op::Failed => ClientEvent::TransportFailed { reason: "fuzz".to_string() },
            Op::RawFrame(raw) => ClientEvent::FrameReceived(raw),
            Op::Open(r) => ClientEvent::OpenRoom { room_id: room(r) },
            Op::Close => ClientEvent::CloseRoom,
            Op::Keystroke => ClientEvent::Keystroke { now: chatsync_core::Environment::now(&env) },
            Op::Send(text) => ClientEvent::SendMessage { text },
            Op::Leave(r) => ClientEvent::LeaveRoom { room_id: room(r) },
            Op::Delete(r) => ClientEvent::DeleteRoom { room_id: room(r) },
            Op::Advance(millis) => {
                env.advance(Duration::from_millis(u64::from(millis)));
                ClientEvent::Tick { now: chatsync_core::Environment::now(&env) }
            },
            Op::Profile { rooms, unread, push: true } => {
                ClientEvent::ProfilePushed(profile(&rooms, &unread))
            },
            Op::Profile { rooms, unread, push: false } => {
                ClientEvent::StoreCompleted(StoreReply::Profile(profile(&rooms, &unread)))
            },
            Op::History { room: r, generation, texts } => {
                let messages = texts
                    .into_iter()
                    .map(|text| StoredMessage {
                        id: None,
                        user_id: UserId::from("p0"),
                        username: "Pat".to_string(),
                        room_id: room(r),
                        text,
                        timestamp: chatsync_core::Environment::wall_clock(&env),
                    })
                    .collect();
                ClientEvent::StoreCompleted(StoreReply::History {
                    room_id: room(r),
                    generation: Generation::new(u64::from(generation)),
                    messages,
                })
            },
            Op::Rooms(rooms) => {
                let requested: Vec<RoomId> = rooms.iter().copied().map(room).collect();
                let docs = requested
                    .iter()
                    .filter(|id| id.as_str() != "ghost")
                    .map(|id| {
                        RoomDocument::group(
                            id.clone(),
                            id.as_str(),
                            &UserId::from("me"),
                            Vec::new(),
                            chatsync_core::Environment::wall_clock(&env),
                        )
                    })
                    .collect();
                ClientEvent::StoreCompleted(StoreReply::Rooms { requested, rooms: docs })
            },
            Op::Shutdown => ClientEvent::Shutdown,
        };

        let _ = client.handle(event);

        if let Some(active) = client.active_room() {
            assert_eq!(client.unread().get(active), 0, "active room has unread");
            assert!(client.messages().iter().all(|m| m.room_id == *active));
        }
        if errored {
            assert_eq!(client.session_state(), SessionState::Errored, "left Errored");
        }
        errored = client.session_state() == SessionState::Errored;
    }
});
