//! chatsync terminal client.
//!
//! # Usage
//!
//! ```bash
//! chatsync --server ws://localhost:8080 --user-id ann --username Ann
//! ```
//!
//! Logs go to stderr; redirect it (`2>chatsync.log`) to keep the chat view
//! clean.

use std::time::Duration;

use chatsync_app::{MemoryStore, Runtime};
use chatsync_cli::{SystemEnv, TerminalDriver};
use chatsync_client::{ClientIdentity, SyncConfig};
use chatsync_proto::{RoomId, UserDocument};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// chatsync terminal client
#[derive(Parser, Debug)]
#[command(name = "chatsync")]
#[command(about = "Real-time chat client")]
#[command(version)]
struct Args {
    /// Transport endpoint
    #[arg(short, long, env = "CHATSYNC_SERVER", default_value = "ws://localhost:8080")]
    server: String,

    /// Your user id
    #[arg(short, long, env = "CHATSYNC_USER_ID")]
    user_id: String,

    /// Display name sent with every frame (defaults to the user id)
    #[arg(short = 'n', long, env = "CHATSYNC_USERNAME")]
    username: Option<String>,

    /// Room to open on start
    #[arg(short, long, env = "CHATSYNC_ROOM")]
    room: Option<String>,

    /// Room opened when the current one is left or deleted
    #[arg(long, env = "CHATSYNC_DEFAULT_ROOM", default_value = "general")]
    default_room: String,

    /// Idle time after the last keystroke before typing stops, in ms
    #[arg(long, default_value = "2000")]
    typing_idle_ms: u64,

    /// Persisted messages loaded when a room opens
    #[arg(long, default_value = "50")]
    history_limit: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            typing_idle_window: Duration::from_millis(self.typing_idle_ms),
            history_limit: self.history_limit,
            default_room: Some(RoomId::from(self.default_room.as_str())),
            ..SyncConfig::default()
        }
    }

    fn identity(&self) -> ClientIdentity {
        let username = self.username.clone().unwrap_or_else(|| self.user_id.clone());
        ClientIdentity::new(self.user_id.as_str(), username)
    }
}

/// The durable store backend is an external collaborator; the terminal
/// client runs against an in-process store seeded with the user's profile.
fn local_store(args: &Args, identity: &ClientIdentity) -> MemoryStore {
    let store = MemoryStore::new();
    let default_room = RoomId::from(args.default_room.as_str());
    let mut chat_rooms = vec![default_room];
    if let Some(room) = &args.room {
        chat_rooms.push(RoomId::from(room.as_str()));
    }
    chat_rooms.dedup();
    store.put_user(identity.user_id.clone(), UserDocument {
        username: identity.username.clone(),
        chat_rooms,
        last_opened_chat_room: args.room.as_deref().map(RoomId::from),
        ..UserDocument::default()
    });
    store
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(filter)
        .init();

    let identity = args.identity();
    let store = local_store(&args, &identity);
    tracing::info!(user_id = %identity.user_id, server = %args.server, "chatsync starting");

    let driver = TerminalDriver::new(args.server.clone())?;
    let runtime = Runtime::new(driver, store, SystemEnv::new(), identity, args.sync_config());
    runtime.run().await?;

    Ok(())
}
