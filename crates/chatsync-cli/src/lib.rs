//! Terminal client for chatsync.
//!
//! A thin shell over [`chatsync_app::Driver`] that provides terminal I/O and
//! the WebSocket transport. All orchestration lives in the generic
//! [`chatsync_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod input;
pub mod render;
pub mod system_env;
pub mod terminal;

pub use commands::Command;
pub use input::{InputState, KeyInput, KeyOutcome};
pub use render::Screen;
pub use system_env::SystemEnv;
pub use terminal::{TerminalDriver, TerminalError};
