//! Property-based tests for the runtime.
//!
//! Random operation sequences (user intents, peer frames, store changes made
//! elsewhere, time, transport loss) run through the real runtime. The
//! standard invariants are checked after every applied event.

use std::time::Duration;

use chatsync_app::{DriverInput, UserIntent};
use chatsync_client::ClientIdentity;
use chatsync_harness::{SIM_EPOCH_SECS, Scenario, SimDriver, SimStep};
use chatsync_proto::{Frame, FrameKind, RoomDocument, RoomId, UserDocument, UserId};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

const ROOMS: [&str; 5] = ["general", "g0", "g1", "g2", "ghost"];
const PEERS: [&str; 3] = ["p0", "p1", "p2"];

fn room(index: u8) -> RoomId {
    RoomId::from(ROOMS[index as usize % ROOMS.len()])
}

fn peer(index: u8) -> UserId {
    UserId::from(PEERS[index as usize % PEERS.len()])
}

/// Operations that can be applied to a session.
#[derive(Debug, Clone)]
enum Operation {
    Open(u8),
    Direct(u8),
    CreateGroup { members: u8 },
    Close,
    Keystroke,
    Send(u8),
    Leave(u8),
    Delete(u8),
    PeerMessage { peer: u8, room: u8, seq: u8 },
    PeerTyping { peer: u8, room: u8 },
    PeerStopTyping { room: u8 },
    Garbage,
    AdvanceTime { millis: u16 },
    JoinedElsewhere(u8),
    RemovedElsewhere(u8),
    UnreadElsewhere(u8),
    TransportLost,
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => any::<u8>().prop_map(Operation::Open),
        1 => any::<u8>().prop_map(Operation::Direct),
        1 => any::<u8>().prop_map(|members| Operation::CreateGroup { members }),
        1 => Just(Operation::Close),
        4 => Just(Operation::Keystroke),
        3 => any::<u8>().prop_map(Operation::Send),
        1 => any::<u8>().prop_map(Operation::Leave),
        1 => any::<u8>().prop_map(Operation::Delete),
        4 => (any::<u8>(), any::<u8>(), any::<u8>())
            .prop_map(|(peer, room, seq)| Operation::PeerMessage { peer, room, seq }),
        2 => (any::<u8>(), any::<u8>()).prop_map(|(peer, room)| Operation::PeerTyping { peer, room }),
        1 => any::<u8>().prop_map(|room| Operation::PeerStopTyping { room }),
        1 => Just(Operation::Garbage),
        3 => (0u16..5000).prop_map(|millis| Operation::AdvanceTime { millis }),
        1 => any::<u8>().prop_map(Operation::JoinedElsewhere),
        1 => any::<u8>().prop_map(Operation::RemovedElsewhere),
        2 => any::<u8>().prop_map(Operation::UnreadElsewhere),
        1 => Just(Operation::TransportLost),
    ]
}

fn script(driver: &mut SimDriver, operation: &Operation) {
    let me = UserId::from("me");
    let at = Utc.timestamp_opt(SIM_EPOCH_SECS, 0).unwrap();
    match operation.clone() {
        Operation::Open(r) => driver.push_intent(UserIntent::OpenRoom(room(r))),
        Operation::Direct(p) => driver.push_intent(UserIntent::OpenDirect(peer(p))),
        Operation::CreateGroup { members } => driver.push_intent(UserIntent::CreateGroup {
            name: format!("group {members}"),
            members: (0..3).filter(|bit| members & (1 << bit) != 0).map(peer).collect(),
        }),
        Operation::Close => driver.push_intent(UserIntent::CloseRoom),
        Operation::Keystroke => driver.push_intent(UserIntent::Keystroke),
        Operation::Send(seq) => driver.push_intent(UserIntent::Send(format!("mine {seq}"))),
        Operation::Leave(r) => driver.push_intent(UserIntent::Leave(room(r))),
        Operation::Delete(r) => driver.push_intent(UserIntent::Delete(room(r))),
        Operation::PeerMessage { peer: p, room: r, seq } => {
            let frame = Frame::message(peer(p), "Peer", room(r), format!("theirs {seq}"), at);
            driver.push_frame(&frame).unwrap();
        },
        Operation::PeerTyping { peer: p, room: r } => {
            driver.push_frame(&Frame::typing(peer(p), "Peer", room(r))).unwrap();
        },
        Operation::PeerStopTyping { room: r } => {
            driver.push_frame(&Frame::stop_typing(peer(0), "Peer", room(r))).unwrap();
        },
        Operation::Garbage => driver.push_raw("{\"type\":"),
        Operation::AdvanceTime { millis } => {
            driver.push(SimStep::Advance(Duration::from_millis(u64::from(millis))));
        },
        Operation::JoinedElsewhere(r) => driver.push_store(move |store| {
            if let Some(mut doc) = store.user(&me) {
                if !doc.chat_rooms.contains(&room(r)) {
                    doc.chat_rooms.push(room(r));
                }
                store.put_user(me, doc);
            }
        }),
        Operation::RemovedElsewhere(r) => driver.push_store(move |store| {
            if let Some(mut doc) = store.user(&me) {
                doc.chat_rooms.retain(|id| *id != room(r));
                store.put_user(me, doc);
            }
        }),
        Operation::UnreadElsewhere(r) => driver.push_store(move |store| {
            store.bump_unread(&me, &room(r));
        }),
        Operation::TransportLost => driver
            .push(SimStep::Input(DriverInput::TransportClosed { reason: "reset".to_string() })),
    }
}

fn scenario(seed: u64, operations: &[Operation]) -> Scenario {
    let mut scenario = Scenario::new(seed, ClientIdentity::new("me", "Me"));
    let store = scenario.store().clone();
    let at = Utc.timestamp_opt(SIM_EPOCH_SECS - 60, 0).unwrap();

    store.put_user("me", UserDocument {
        username: "Me".to_string(),
        chat_rooms: vec![room(0), room(1), room(2)],
        last_opened_chat_room: Some(room(1)),
        ..UserDocument::default()
    });
    for id in PEERS {
        store.put_user(id, UserDocument { username: id.to_uppercase(), ..UserDocument::default() });
    }
    let me = UserId::from("me");
    store.put_room(RoomDocument::group(room(1), "Zero", &me, [peer(0)], at));
    store.put_room(RoomDocument::group(room(2), "One", &peer(0), [me, peer(1)], at));
    store.put_room(RoomDocument::group(room(3), "Two", &peer(1), [peer(2)], at));

    for operation in operations {
        script(scenario.driver_mut(), operation);
    }
    scenario
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Client invariants hold under arbitrary operation sequences.
    #[test]
    fn prop_invariants_hold(
        seed in any::<u64>(),
        operations in prop::collection::vec(operation_strategy(), 0..40),
    ) {
        let result = scenario(seed, &operations).run();
        prop_assert!(result.is_ok(), "{}", result.err().map(|e| e.to_string()).unwrap_or_default());
    }

    /// The same seed and script always produce the same session.
    #[test]
    fn prop_runs_are_deterministic(
        seed in any::<u64>(),
        operations in prop::collection::vec(operation_strategy(), 0..30),
    ) {
        let first = scenario(seed, &operations).run().unwrap();
        let second = scenario(seed, &operations).run().unwrap();

        prop_assert_eq!(first.driver().sent(), second.driver().sent());
        prop_assert_eq!(first.driver().notices(), second.driver().notices());
        prop_assert_eq!(first.driver().last_live_view(), second.driver().last_live_view());
        prop_assert_eq!(first.client().unread(), second.client().unread());
    }

    /// While connected, our typing indicator never starts twice without a
    /// stop in between, and the session never ends with it running.
    #[test]
    fn prop_typing_indicator_is_balanced(
        operations in prop::collection::vec(
            operation_strategy().prop_filter("transport stays up", |op| {
                !matches!(op, Operation::TransportLost)
            }),
            0..40,
        ),
    ) {
        let runtime = scenario(0, &operations).run().unwrap();

        let mut running = false;
        for frame in runtime.driver().sent_frames() {
            if frame.user_id != UserId::from("me") {
                continue;
            }
            match frame.kind {
                FrameKind::Typing => {
                    prop_assert!(!running, "typing sent twice without stop");
                    running = true;
                },
                FrameKind::StopTyping => running = false,
                FrameKind::Message | FrameKind::Join => {},
            }
        }
        prop_assert!(!running, "session ended with typing indicator running");
    }
}
