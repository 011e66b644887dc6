//! Property-based tests for transport frames and room ids.
//!
//! Frame decoding sits on the inbound path of every session, so it must
//! reject bad input with an error and never panic. Direct room ids must be
//! stable regardless of which participant computes them.

use chatsync_proto::{Frame, FrameKind, ProtocolError, RoomId, UserId};
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

fn arbitrary_id() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,24}"
}

fn arbitrary_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    // 2001-09-09 .. 2033-05-18, whole seconds
    (1_000_000_000i64..2_000_000_000i64)
        .prop_filter_map("valid timestamp", |secs| Utc.timestamp_opt(secs, 0).single())
}

fn arbitrary_frame() -> impl Strategy<Value = Frame> {
    (
        prop_oneof![
            Just(FrameKind::Message),
            Just(FrameKind::Typing),
            Just(FrameKind::StopTyping),
            Just(FrameKind::Join),
        ],
        arbitrary_id(),
        ".{0,32}",
        arbitrary_id(),
        ".{0,256}",
        arbitrary_timestamp(),
    )
        .prop_map(|(kind, user, name, room, text, ts)| {
            let user = UserId::from(user);
            let room = RoomId::from(room);
            match kind {
                FrameKind::Message => Frame::message(user, name, room, text, ts),
                FrameKind::Typing => Frame::typing(user, name, room),
                FrameKind::StopTyping => Frame::stop_typing(user, name, room),
                FrameKind::Join => Frame::join(user, name, room),
            }
        })
}

proptest! {
    #[test]
    fn prop_decode_never_panics(raw in ".{0,512}") {
        let _ = Frame::decode(&raw);
    }

    #[test]
    fn prop_encoded_frames_decode_to_same_frame(frame in arbitrary_frame()) {
        let raw = frame.encode().unwrap();
        let decoded = Frame::decode(&raw).unwrap();
        prop_assert_eq!(decoded, frame);
    }

    #[test]
    fn prop_direct_room_id_symmetric(a in arbitrary_id(), b in arbitrary_id()) {
        let a = UserId::from(a);
        let b = UserId::from(b);
        let ab = RoomId::direct(&a, &b);
        let ba = RoomId::direct(&b, &a);
        prop_assert_eq!(&ab, &ba);

        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert_eq!(ab.as_str(), format!("{}_{}", lo, hi));
    }

    #[test]
    fn prop_message_without_text_rejected(user in arbitrary_id(), room in arbitrary_id()) {
        let raw = format!(
            r#"{{"type":"message","userId":"{user}","username":"x","roomId":"{room}"}}"#
        );
        prop_assert!(matches!(Frame::decode(&raw), Err(ProtocolError::MissingText)));
    }
}
