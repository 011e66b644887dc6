//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`chatsync_app::Runtime`] orchestration code runs in both production and
//! simulation. Inputs come from a script; frames and notices are captured.

use std::{collections::VecDeque, time::Duration};

use chatsync_app::{Driver, DriverInput, MemoryStore, UserIntent};
use chatsync_client::{Client, Environment, NoticeLevel};
use chatsync_core::SessionState;
use chatsync_proto::Frame;

use crate::{
    ClientView, SimEnv,
    invariants::{ClientSnapshot, InvariantRegistry, SystemSnapshot},
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Out-of-band change to the store, as if made by another client.
pub type StoreMutation = Box<dyn FnOnce(&MemoryStore) + Send>;

/// One scripted step.
pub enum SimStep {
    /// Hand an input to the runtime.
    Input(DriverInput),
    /// Mutate the store, then let the runtime observe any push.
    Store(StoreMutation),
    /// Advance virtual time, then let the runtime tick.
    Advance(Duration),
}

impl std::fmt::Debug for SimStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(input) => f.debug_tuple("Input").field(input).finish(),
            Self::Store(_) => f.write_str("Store(..)"),
            Self::Advance(duration) => f.debug_tuple("Advance").field(duration).finish(),
        }
    }
}

/// Simulation driver for deterministic testing.
///
/// When the script runs out the driver reports [`DriverInput::Quit`].
pub struct SimDriver {
    env: SimEnv,
    store: MemoryStore,
    script: VecDeque<SimStep>,
    sent: Vec<String>,
    notices: Vec<(NoticeLevel, String)>,
    refuse_connect: bool,
    connected: bool,
    closes: usize,
    invariants: Option<InvariantRegistry>,
    generations: Vec<u64>,
    states: Vec<SessionState>,
    renders: usize,
    last_live: Option<ClientView>,
}

impl SimDriver {
    /// Create a driver bound to the simulation's clock and store.
    pub fn new(env: &SimEnv, store: &MemoryStore) -> Self {
        Self {
            env: env.clone(),
            store: store.clone(),
            script: VecDeque::new(),
            sent: Vec::new(),
            notices: Vec::new(),
            refuse_connect: false,
            connected: false,
            closes: 0,
            invariants: None,
            generations: Vec::new(),
            states: Vec::new(),
            renders: 0,
            last_live: None,
        }
    }

    /// Check invariants after every event the runtime applies. A violation
    /// stops the runtime with an error.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Make every connection attempt fail.
    #[must_use]
    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    /// Append a step.
    pub fn push(&mut self, step: SimStep) {
        self.script.push_back(step);
    }

    /// Append a user intent.
    pub fn push_intent(&mut self, intent: UserIntent) {
        self.push(SimStep::Input(DriverInput::Intent(intent)));
    }

    /// Append a frame from the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be encoded.
    pub fn push_frame(&mut self, frame: &Frame) -> Result<(), SimDriverError> {
        let raw = frame.encode().map_err(|e| SimDriverError(e.to_string()))?;
        self.push(SimStep::Input(DriverInput::Frame(raw)));
        Ok(())
    }

    /// Append a raw text frame, which need not be valid.
    pub fn push_raw(&mut self, raw: impl Into<String>) {
        self.push(SimStep::Input(DriverInput::Frame(raw.into())));
    }

    /// Append a store mutation.
    pub fn push_store(&mut self, mutation: impl FnOnce(&MemoryStore) + Send + 'static) {
        self.push(SimStep::Store(Box::new(mutation)));
    }

    /// Raw frames sent so far.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Decoded frames sent so far. Undecodable frames are skipped.
    pub fn sent_frames(&self) -> Vec<Frame> {
        self.sent.iter().filter_map(|raw| Frame::decode(raw).ok()).collect()
    }

    /// Notices shown so far.
    pub fn notices(&self) -> &[(NoticeLevel, String)] {
        &self.notices
    }

    /// Whether the simulated socket is open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of close calls.
    pub fn closes(&self) -> usize {
        self.closes
    }

    /// Number of renders (one per applied event batch).
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Client state at the last render before shutdown.
    pub fn last_live_view(&self) -> Option<&ClientView> {
        self.last_live.as_ref()
    }

    /// Snapshot of `client` including the histories recorded so far.
    pub fn snapshot<E: Environment>(&self, client: &Client<E>) -> SystemSnapshot {
        let client = ClientSnapshot::from_client(client)
            .with_history(self.generations.clone(), self.states.clone());
        SystemSnapshot::single(client)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn connect(&mut self) -> Result<(), SimDriverError> {
        if self.refuse_connect {
            return Err(SimDriverError("connection refused".to_string()));
        }
        self.connected = true;
        Ok(())
    }

    async fn send_text(&mut self, text: String) -> Result<(), SimDriverError> {
        if !self.connected {
            return Err(SimDriverError("socket closed".to_string()));
        }
        self.sent.push(text);
        Ok(())
    }

    async fn recv(&mut self) -> DriverInput {
        while let Some(step) = self.script.pop_front() {
            match step {
                SimStep::Input(DriverInput::TransportClosed { reason }) => {
                    self.connected = false;
                    return DriverInput::TransportClosed { reason };
                },
                SimStep::Input(input) => return input,
                SimStep::Store(mutation) => {
                    mutation(&self.store);
                    tokio::task::yield_now().await;
                },
                SimStep::Advance(duration) => {
                    self.env.advance(duration);
                    tokio::task::yield_now().await;
                },
            }
        }
        DriverInput::Quit
    }

    fn close(&mut self) {
        self.connected = false;
        self.closes += 1;
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) -> Result<(), SimDriverError> {
        tracing::debug!(?level, %message, "notice");
        self.notices.push((level, message.to_string()));
        Ok(())
    }

    fn render<E: Environment>(&mut self, client: &Client<E>) -> Result<(), SimDriverError> {
        self.renders += 1;
        self.generations.push(client.generation().value());
        self.states.push(client.session_state());
        if !client.is_shut_down() {
            self.last_live = Some(ClientView::capture(client));
        }

        let Some(registry) = &self.invariants else {
            return Ok(());
        };
        let snapshot = self.snapshot(client);
        registry.check_all(&snapshot).map_err(|violations| {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            SimDriverError(format!(
                "invariant violation at render {}:\n  {}",
                self.renders,
                messages.join("\n  ")
            ))
        })
    }
}
