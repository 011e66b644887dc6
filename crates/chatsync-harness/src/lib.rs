//! Deterministic simulation harness for chatsync testing.
//!
//! Simulated implementations of the Environment and Driver traits for
//! deterministic, reproducible runs of the real runtime against an in-memory
//! store.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the client
//! invariants; [`Scenario`] enables them by default.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod scenario;
pub mod sim_driver;
pub mod sim_env;
pub mod view;

pub use invariants::{
    ActiveRoomOpenable, ActiveRoomUnreadCleared, ClientSnapshot, ErroredIsTerminal,
    GenerationMonotonicity, Invariant, InvariantRegistry, InvariantResult,
    MessagesMatchActiveRoom, SystemSnapshot, TypingRequiresActiveRoom, Violation,
};
pub use scenario::{Scenario, SimRuntime};
pub use sim_driver::{SimDriver, SimDriverError, SimStep, StoreMutation};
pub use sim_env::{SIM_EPOCH_SECS, SimEnv, SimInstant};
pub use view::ClientView;
