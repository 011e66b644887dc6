//! Client invariants.
//!
//! [`crate::SimDriver`] captures a [`SystemSnapshot`] after every event the
//! runtime applies and runs an [`InvariantRegistry`] over it. Checks see the
//! snapshot only, never the live client, so a check cannot race a state
//! change.
//!
//! ```ignore
//! let snapshot = SystemSnapshot::single(ClientSnapshot::from_client(&client));
//! InvariantRegistry::standard().check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    ActiveRoomOpenable, ActiveRoomUnreadCleared, ErroredIsTerminal, GenerationMonotonicity,
    MessagesMatchActiveRoom, TypingRequiresActiveRoom,
};
pub use snapshot::{ClientSnapshot, SystemSnapshot};

/// Outcome of a single check.
pub type InvariantResult = Result<(), Violation>;

/// A broken invariant, attributed to the client it was observed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the broken invariant.
    pub invariant: &'static str,
    /// Identifier of the offending client.
    pub client: String,
    /// What was observed.
    pub message: String,
}

impl Violation {
    /// Violation of `invariant` on `client`.
    pub fn new(invariant: &'static str, client: &str, message: impl Into<String>) -> Self {
        Self { invariant, client: client.to_string(), message: message.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] client {}: {}", self.invariant, self.client, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property of client state that holds after every applied event.
pub trait Invariant: Send + Sync {
    /// Stable name used in violation reports.
    fn name(&self) -> &'static str;

    /// Check `state`, reporting the first offending client.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Ordered set of invariants checked together.
#[derive(Default)]
pub struct InvariantRegistry {
    checks: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Registry with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every client invariant the harness knows about.
    pub fn standard() -> Self {
        Self::new()
            .with(ActiveRoomUnreadCleared)
            .with(ActiveRoomOpenable)
            .with(MessagesMatchActiveRoom)
            .with(GenerationMonotonicity)
            .with(ErroredIsTerminal)
            .with(TypingRequiresActiveRoom)
    }

    /// Append `invariant`.
    #[must_use]
    pub fn with<I: Invariant + 'static>(mut self, invariant: I) -> Self {
        self.checks.push(Box::new(invariant));
        self
    }

    /// Names of the registered checks, in check order.
    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|check| check.name()).collect()
    }

    /// Run every check. Collects all violations instead of stopping at the
    /// first one.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        for check in &self.checks {
            if let Err(violation) = check.check(state) {
                violations.push(violation);
            }
        }

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}
