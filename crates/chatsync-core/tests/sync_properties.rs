//! Property-based tests for the synchronization state machines.
//!
//! Each property is checked against a simple oracle computed independently of
//! the implementation under test.

use std::{collections::BTreeMap, time::Duration};

use chatsync_core::{
    ConnectionManager, Generation, Message, RoomSession, TypingDebouncer, TypingSignal,
    merge_unread,
};
use chatsync_proto::{RoomId, StoredMessage};
use chrono::{DateTime, Offset, TimeZone, Utc};
use proptest::prelude::*;

fn room(n: u8) -> RoomId {
    RoomId::from(format!("room-{n}"))
}

fn ledger_strategy() -> impl Strategy<Value = BTreeMap<RoomId, u32>> {
    prop::collection::btree_map((0u8..8).prop_map(room), 0u32..20, 0..8)
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_714_564_800 + secs, 0).single().unwrap_or_default()
}

fn stored(body: String, secs: i64) -> StoredMessage {
    StoredMessage {
        id: None,
        user_id: "u2".into(),
        username: "Bo".into(),
        room_id: "active".into(),
        text: body,
        timestamp: at(secs),
    }
}

proptest! {
    /// Remote snapshot wins for keys it mentions, local value kept otherwise.
    #[test]
    fn prop_unread_merge_per_key(
        local in ledger_strategy(),
        remote in ledger_strategy(),
        active in prop::option::of((0u8..8).prop_map(room)),
    ) {
        let merged = merge_unread(&local, &remote, active.as_ref());

        for key in local.keys().chain(remote.keys()) {
            let expected = if Some(key) == active.as_ref() {
                None
            } else if let Some(&r) = remote.get(key) {
                (r > 0).then_some(r)
            } else {
                local.get(key).copied()
            };
            prop_assert_eq!(merged.get(key).copied(), expected, "key {}", key);
        }
        if let Some(active) = &active {
            prop_assert!(!merged.contains_key(active));
        }
    }

    /// Merging the same snapshot twice is the same as merging it once.
    #[test]
    fn prop_unread_merge_idempotent(local in ledger_strategy(), remote in ledger_strategy()) {
        let once = merge_unread(&local, &remote, None);
        let twice = merge_unread(&once, &remote, None);
        prop_assert_eq!(once, twice);
    }

    /// Any keystroke schedule followed by silence yields exactly one Start per
    /// burst and exactly one Stop per burst.
    #[test]
    fn prop_typing_start_stop_balanced(gaps in prop::collection::vec(0u64..5000, 1..40)) {
        let window = Duration::from_millis(2000);
        let mut deb = TypingDebouncer::new(window);
        let mut now = Duration::ZERO;
        let mut starts = 0usize;
        let mut stops = 0usize;

        for gap in gaps {
            let next = now + Duration::from_millis(gap);
            // Ticks at 100ms resolution between keystrokes.
            while now < next {
                now += Duration::from_millis(100);
                if deb.tick(now) == Some(TypingSignal::Stop) {
                    stops += 1;
                }
            }
            if deb.keystroke(now) == Some(TypingSignal::Start) {
                starts += 1;
            }
            prop_assert!(deb.is_typing());
        }

        // Silence long enough to expire.
        let end = now + window;
        while now < end {
            now += Duration::from_millis(100);
            if deb.tick(now) == Some(TypingSignal::Stop) {
                stops += 1;
            }
        }

        prop_assert!(!deb.is_typing());
        prop_assert_eq!(starts, stops);
    }

    /// The visible list is the history window followed by the live frames in
    /// arrival order, with live frames already in history skipped.
    #[test]
    fn prop_history_then_live_in_arrival_order(
        history in prop::collection::vec(("[a-z]{1,6}", 0i64..1000), 0..60),
        live_during_load in prop::collection::vec(("[a-z]{1,6}", 1000i64..2000), 0..10),
        live_after in prop::collection::vec(("[a-z]{1,6}", 2000i64..3000), 0..10),
        limit in 1usize..50,
    ) {
        let token = ConnectionManager::new().subscribe();
        let mut session = RoomSession::new("active".into(), Generation::new(1), token, limit);
        let offset = Utc.fix();
        let to_message = |(body, secs): &(String, i64)| {
            Message::from_stored(stored(body.clone(), *secs), at(*secs), offset)
        };

        for entry in &live_during_load {
            session.push_live(to_message(entry));
        }
        let stored_history: Vec<StoredMessage> =
            history.iter().map(|(b, s)| stored(b.clone(), *s)).collect();
        session.apply_history(Generation::new(1), stored_history, at(5000), offset).unwrap();
        for entry in &live_after {
            session.push_live(to_message(entry));
        }

        // Oracle
        let mut window = history.clone();
        window.sort_by_key(|(_, secs)| *secs);
        let skip = window.len().saturating_sub(limit);
        let window: Vec<(String, i64)> = window.into_iter().skip(skip).collect();
        let mut expected: Vec<(String, i64)> = window.clone();
        for entry in &live_during_load {
            if !window.contains(entry) {
                expected.push(entry.clone());
            }
        }
        expected.extend(live_after.iter().cloned());

        let actual: Vec<(String, i64)> = session
            .messages()
            .iter()
            .map(|m| (m.body.clone(), m.sent_at.timestamp() - 1_714_564_800))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    /// A history result tagged with an older generation never mutates the
    /// session.
    #[test]
    fn prop_stale_history_discarded(stale in 0u64..10, bodies in prop::collection::vec("[a-z]{1,4}", 1..10)) {
        let current = Generation::new(10);
        let token = ConnectionManager::new().subscribe();
        let mut session = RoomSession::new("active".into(), current, token, 50);
        let history = bodies.into_iter().enumerate().map(|(i, b)| stored(b, i as i64)).collect();

        let result = session.apply_history(Generation::new(stale), history, at(0), Utc.fix());
        prop_assert!(result.is_err());
        prop_assert!(session.messages().is_empty());
        prop_assert!(!session.is_live());
    }
}
