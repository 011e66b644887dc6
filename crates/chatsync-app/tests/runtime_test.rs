//! Runtime tests
//!
//! Drive the full loop (client, scripted driver, in-memory store) and check
//! what ends up on the transport, in the store and in the client.

use std::{collections::VecDeque, fmt, time::Duration};

use chatsync_app::{Driver, DriverInput, DurableStore, MemoryStore, Runtime, UserIntent};
use chatsync_client::{Client, ClientIdentity, Environment, NoticeLevel, SyncConfig};
use chatsync_core::SessionState;
use chatsync_proto::{
    Frame, FrameKind, RoomDocument, RoomId, StoredMessage, UserDocument, UserId,
};
use chrono::{DateTime, TimeZone, Utc};

#[derive(Clone)]
struct TestEnv;

impl Environment for TestEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = i as u8;
        }
    }
}

#[derive(Debug)]
struct ScriptError(String);

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script error: {}", self.0)
    }
}

impl std::error::Error for ScriptError {}

type StoreStep = Box<dyn FnOnce(&MemoryStore) + Send>;

enum Step {
    Input(DriverInput),
    Store(StoreStep),
}

/// What the client showed at a render.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Shown {
    active_room: Option<RoomId>,
    bodies: Vec<String>,
    session_state: SessionState,
}

/// Driver that replays a script and records everything the runtime emits.
struct ScriptDriver {
    store: MemoryStore,
    script: VecDeque<Step>,
    sent: Vec<String>,
    notices: Vec<(NoticeLevel, String)>,
    refuse_connect: bool,
    closes: usize,
    shown: Option<Shown>,
}

impl ScriptDriver {
    fn new(store: &MemoryStore) -> Self {
        Self {
            store: store.clone(),
            script: VecDeque::new(),
            sent: Vec::new(),
            notices: Vec::new(),
            refuse_connect: false,
            closes: 0,
            shown: None,
        }
    }

    fn intent(mut self, intent: UserIntent) -> Self {
        self.script.push_back(Step::Input(DriverInput::Intent(intent)));
        self
    }

    fn frame(mut self, frame: &Frame) -> Self {
        self.script.push_back(Step::Input(DriverInput::Frame(frame.encode().unwrap())));
        self
    }

    fn store_step(mut self, step: impl FnOnce(&MemoryStore) + Send + 'static) -> Self {
        self.script.push_back(Step::Store(Box::new(step)));
        self
    }

    fn sent_frames(&self) -> Vec<Frame> {
        self.sent.iter().map(|raw| Frame::decode(raw).unwrap()).collect()
    }

    /// Last render before the session shut down.
    fn shown(&self) -> &Shown {
        self.shown.as_ref().unwrap()
    }
}

impl Driver for ScriptDriver {
    type Error = ScriptError;

    async fn connect(&mut self) -> Result<(), ScriptError> {
        if self.refuse_connect {
            Err(ScriptError("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), ScriptError> {
        self.sent.push(text);
        Ok(())
    }

    async fn recv(&mut self) -> DriverInput {
        while let Some(step) = self.script.pop_front() {
            match step {
                Step::Input(input) => return input,
                Step::Store(apply) => {
                    apply(&self.store);
                    // Let the runtime observe the push before the next input.
                    tokio::task::yield_now().await;
                },
            }
        }
        DriverInput::Quit
    }

    fn close(&mut self) {
        self.closes += 1;
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) -> Result<(), ScriptError> {
        self.notices.push((level, message.to_string()));
        Ok(())
    }

    fn render<E: Environment>(&mut self, client: &Client<E>) -> Result<(), ScriptError> {
        if !client.is_shut_down() {
            self.shown = Some(Shown {
                active_room: client.active_room().cloned(),
                bodies: client.messages().iter().map(|m| m.body.clone()).collect(),
                session_state: client.session_state(),
            });
        }
        Ok(())
    }
}

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn me() -> UserId {
    UserId::from("me")
}

/// `me` and `peer` share group `r1`; `me` last had `r1` open.
fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.put_user("me", UserDocument {
        username: "Me".to_string(),
        chat_rooms: vec![RoomId::from("general"), RoomId::from("r1")],
        last_opened_chat_room: Some(RoomId::from("r1")),
        ..UserDocument::default()
    });
    store.put_user("peer", UserDocument {
        username: "Peer".to_string(),
        chat_rooms: vec![RoomId::from("r1")],
        ..UserDocument::default()
    });
    store.put_room(RoomDocument::group(
        RoomId::from("r1"),
        "Team",
        &UserId::from("peer"),
        [me()],
        ts(0),
    ));
    for (secs, text) in [(10, "first"), (20, "second")] {
        store.append_message(StoredMessage {
            id: None,
            user_id: UserId::from("peer"),
            username: "Peer".to_string(),
            room_id: RoomId::from("r1"),
            text: text.to_string(),
            timestamp: ts(secs),
        });
    }
    store
}

fn runtime(driver: ScriptDriver, store: &MemoryStore) -> Runtime<ScriptDriver, MemoryStore, TestEnv> {
    Runtime::new(driver, store.clone(), TestEnv, ClientIdentity::new("me", "Me"), SyncConfig::default())
}

#[tokio::test(start_paused = true)]
async fn bootstrap_reopens_last_room_with_history() {
    let store = seeded_store();
    let driver = ScriptDriver::new(&store);

    let runtime = runtime(driver, &store).run().await.unwrap();

    let shown = runtime.driver().shown();
    assert_eq!(shown.active_room, Some(RoomId::from("r1")));
    assert_eq!(shown.bodies, vec!["first", "second"]);

    let frames = runtime.driver().sent_frames();
    assert!(
        frames.iter().any(|f| f.kind == FrameKind::Join && f.room_id == RoomId::from("r1")),
        "join must be announced for the reopened room"
    );
    assert!(runtime.driver().closes >= 1);
    assert!(runtime.client().is_shut_down());
    assert_eq!(runtime.client().active_room(), None);
}

#[tokio::test(start_paused = true)]
async fn sent_message_goes_to_transport_and_store() {
    let store = seeded_store();
    let driver = ScriptDriver::new(&store).intent(UserIntent::Send("hello".to_string()));

    let runtime = runtime(driver, &store).run().await.unwrap();

    let frames = runtime.driver().sent_frames();
    let message = frames.iter().find(|f| f.kind == FrameKind::Message).unwrap();
    assert_eq!(message.text.as_deref(), Some("hello"));
    assert_eq!(message.room_id, RoomId::from("r1"));

    let persisted = store.messages(&RoomId::from("r1"));
    assert_eq!(persisted.len(), 3);
    assert_eq!(persisted[2].text, "hello");
    assert_eq!(persisted[2].user_id, me());
}

#[tokio::test(start_paused = true)]
async fn leaving_room_announces_and_falls_back_to_default() {
    let store = seeded_store();
    let driver = ScriptDriver::new(&store).intent(UserIntent::Leave(RoomId::from("r1")));

    let runtime = runtime(driver, &store).run().await.unwrap();

    assert_eq!(runtime.driver().shown().active_room, Some(RoomId::from("general")));
    assert!(!runtime.client().membership().contains(&RoomId::from("r1")));

    let doc = store.user(&me()).unwrap();
    assert!(!doc.chat_rooms.contains(&RoomId::from("r1")));
    assert_eq!(doc.last_opened_chat_room, Some(RoomId::from("general")));
    assert_eq!(store.room(&RoomId::from("r1")).unwrap().participants, vec![UserId::from("peer")]);

    let announcement = store
        .messages(&RoomId::from("r1"))
        .into_iter()
        .find(|m| m.user_id == UserId::system())
        .unwrap();
    assert_eq!(announcement.text, "Me has left the chat.");

    assert!(
        runtime
            .driver()
            .notices
            .contains(&(NoticeLevel::Info, "You have left the room!".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn refused_connection_is_terminal_but_store_keeps_working() {
    let store = seeded_store();
    let mut driver = ScriptDriver::new(&store).intent(UserIntent::Send("offline".to_string()));
    driver.refuse_connect = true;

    let runtime = runtime(driver, &store).run().await.unwrap();

    assert_eq!(runtime.client().session_state(), SessionState::Errored);
    assert!(runtime.driver().sent.is_empty());
    assert!(runtime.driver().notices.iter().any(|(level, _)| *level == NoticeLevel::Error));

    // History still loads and the message is still persisted.
    assert_eq!(runtime.driver().shown().bodies.len(), 2);
    assert_eq!(runtime.driver().shown().session_state, SessionState::Errored);
    assert!(store.messages(&RoomId::from("r1")).iter().any(|m| m.text == "offline"));
}

#[tokio::test(start_paused = true)]
async fn room_created_elsewhere_appears_through_push() {
    let store = seeded_store();
    let driver = ScriptDriver::new(&store).store_step(|store| {
        let doc = RoomDocument::direct(&UserId::from("peer"), &UserId::from("me"), ts(50));
        store.execute(&chatsync_client::StoreRequest::EnsureRoom(doc)).unwrap();
    });

    let runtime = runtime(driver, &store).run().await.unwrap();

    let direct = RoomId::direct(&me(), &UserId::from("peer"));
    let rooms = runtime.client().room_list();
    let room = rooms.iter().find(|r| r.room_id == direct).unwrap();
    assert!(room.pending, "not yet confirmed by a profile refresh");
    assert_eq!(room.display_name, "Peer");
}

#[tokio::test(start_paused = true)]
async fn durable_unread_counter_reaches_client() {
    let store = seeded_store();
    let driver = ScriptDriver::new(&store).store_step(|store| {
        store.bump_unread(&UserId::from("me"), &RoomId::from("general"));
        store.bump_unread(&UserId::from("me"), &RoomId::from("general"));
    });

    let runtime = runtime(driver, &store).run().await.unwrap();

    assert_eq!(runtime.client().unread().get(&RoomId::from("general")), 2);
}

#[tokio::test(start_paused = true)]
async fn live_frames_for_other_rooms_count_as_unread() {
    let store = seeded_store();
    let elsewhere = Frame::message(
        UserId::from("peer"),
        "Peer",
        RoomId::from("general"),
        "psst",
        ts(100),
    );
    let here = Frame::message(UserId::from("peer"), "Peer", RoomId::from("r1"), "hi", ts(101));
    let driver = ScriptDriver::new(&store).frame(&elsewhere).frame(&here);

    let runtime = runtime(driver, &store).run().await.unwrap();

    let client = runtime.client();
    assert_eq!(client.unread().get(&RoomId::from("general")), 1);
    assert_eq!(client.unread().get(&RoomId::from("r1")), 0);
    assert_eq!(runtime.driver().shown().bodies.last().map(String::as_str), Some("hi"));
}

#[tokio::test(start_paused = true)]
async fn rejected_intent_becomes_error_notice() {
    let store = seeded_store();
    let driver = ScriptDriver::new(&store).intent(UserIntent::Delete(RoomId::from("r1")));

    let runtime = runtime(driver, &store).run().await.unwrap();

    // `peer` administers r1, so the room survives.
    assert!(store.room(&RoomId::from("r1")).is_some());
    assert!(runtime.driver().notices.iter().any(|(level, _)| *level == NoticeLevel::Error));
}
