//! Application layer for chatsync
//!
//! Generic runtime and I/O seams around the Sans-IO [`chatsync_client::Client`],
//! enabling deterministic simulation testing with the same loop that runs in
//! production.
//!
//! # Components
//!
//! - [`Runtime`]: single-threaded cooperative event loop
//! - [`Driver`]: trait for platform-specific I/O
//! - [`DurableStore`]: trait for the consumed document store
//! - [`MemoryStore`]: in-memory store with profile push subscriptions

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod error;
mod intent;
mod memory;
mod runtime;
mod store;

pub use driver::{Driver, DriverInput};
pub use error::StoreError;
pub use intent::UserIntent;
pub use memory::{MemoryStore, StoreClock};
pub use runtime::{DEFAULT_TICK_INTERVAL, Runtime};
pub use store::DurableStore;
