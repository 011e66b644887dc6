//! Generic runtime for session orchestration.
//!
//! The Runtime drives a single-threaded cooperative event loop, coordinating
//! between:
//! - [`Client`]: the synchronization state machine
//! - [`Driver`]: platform I/O (transport socket, user input, output)
//! - [`DurableStore`]: document reads, writes and profile pushes
//!
//! Every event is applied to the client to completion before the next one is
//! taken, so state transitions never interleave.

use std::{collections::VecDeque, time::Duration};

use chatsync_client::{
    Client, ClientAction, ClientEvent, ClientIdentity, Environment, NoticeLevel, StoreRequest,
    SyncConfig,
};
use chatsync_core::ConnectionAction;
use chatsync_proto::UserDocument;
use tokio::sync::watch;

use crate::{Driver, DriverInput, DurableStore};

/// Default interval between typing-expiry ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// What woke the loop.
enum Wake {
    Profile,
    PushesClosed,
    Input(DriverInput),
    Tick,
}

/// Generic runtime that orchestrates Client, Driver and DurableStore.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `S`: Durable document store
/// - `E`: Environment for clocks and randomness
pub struct Runtime<D, S, E>
where
    D: Driver,
    S: DurableStore,
    E: Environment,
{
    driver: D,
    store: S,
    env: E,
    client: Client<E>,
    profile: watch::Receiver<Option<UserDocument>>,
    pushes_open: bool,
    pending: VecDeque<StoreRequest>,
    tick_interval: Duration,
}

impl<D, S, E> Runtime<D, S, E>
where
    D: Driver,
    S: DurableStore,
    E: Environment,
{
    /// Create a runtime for `identity`. Subscribes to the profile right away
    /// so no push between construction and [`Runtime::run`] is missed.
    pub fn new(driver: D, store: S, env: E, identity: ClientIdentity, config: SyncConfig) -> Self {
        let profile = store.subscribe_profile(&identity.user_id);
        let client = Client::new(env.clone(), identity, config);
        Self {
            driver,
            store,
            env,
            client,
            profile,
            pushes_open: true,
            pending: VecDeque::new(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Override the tick interval.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// The client state machine.
    pub fn client(&self) -> &Client<E> {
        &self.client
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run until the driver reports [`DriverInput::Quit`].
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to produce output. Transport and
    /// store failures are not errors here; they are fed to the client.
    pub async fn run(mut self) -> Result<Self, D::Error> {
        self.dispatch(ClientEvent::Connect).await?;
        let mut next_tick = self.env.now() + self.tick_interval;

        while !self.client.is_shut_down() {
            self.drain_store().await?;
            if self.client.is_shut_down() {
                break;
            }

            // Ticks keep their cadence under a steady stream of input.
            let now = self.env.now();
            let until_tick = if next_tick > now { next_tick - now } else { Duration::ZERO };

            let wake = tokio::select! {
                biased;
                changed = self.profile.changed(), if self.pushes_open => match changed {
                    Ok(()) => Wake::Profile,
                    Err(_) => Wake::PushesClosed,
                },
                input = self.driver.recv() => Wake::Input(input),
                () = self.env.sleep(until_tick) => Wake::Tick,
            };

            match wake {
                Wake::Profile => {
                    let doc = self.profile.borrow_and_update().clone();
                    if let Some(doc) = doc {
                        self.dispatch(ClientEvent::ProfilePushed(doc)).await?;
                    }
                },
                Wake::PushesClosed => {
                    tracing::warn!("profile subscription closed");
                    self.pushes_open = false;
                },
                Wake::Input(input) => self.handle_input(input).await?,
                Wake::Tick => {
                    let now = self.env.now();
                    next_tick = now + self.tick_interval;
                    self.dispatch(ClientEvent::Tick { now }).await?;
                },
            }
        }

        self.driver.close();
        tracing::info!("runtime stopped");
        Ok(self)
    }

    async fn handle_input(&mut self, input: DriverInput) -> Result<(), D::Error> {
        let event = match input {
            DriverInput::Frame(raw) => ClientEvent::FrameReceived(raw),
            DriverInput::TransportClosed { reason } => ClientEvent::TransportFailed { reason },
            DriverInput::Intent(intent) => intent.into_event(self.env.now()),
            DriverInput::Quit => ClientEvent::Shutdown,
        };
        self.dispatch(event).await
    }

    /// Execute queued store requests, feeding each outcome back to the
    /// client. Requests issued while draining are executed too.
    async fn drain_store(&mut self) -> Result<(), D::Error> {
        while let Some(request) = self.pending.pop_front() {
            let event = match self.store.execute(&request) {
                Ok(reply) => ClientEvent::StoreCompleted(reply),
                Err(err) => {
                    tracing::debug!(
                        kind = ?request.kind(),
                        error = %err,
                        transient = err.is_transient(),
                        "store request failed"
                    );
                    ClientEvent::StoreFailed { request, reason: err.to_string() }
                },
            };
            self.dispatch(event).await?;
        }
        Ok(())
    }

    /// Apply an event and everything it triggers on the transport.
    async fn dispatch(&mut self, event: ClientEvent<E::Instant>) -> Result<(), D::Error> {
        let mut events = VecDeque::from([event]);

        while let Some(event) = events.pop_front() {
            let actions = match self.client.handle(event) {
                Ok(actions) => actions,
                Err(err) => {
                    tracing::debug!(error = %err, "event rejected");
                    self.driver.notify(NoticeLevel::Error, &err.to_string())?;
                    continue;
                },
            };

            for action in actions {
                match action {
                    ClientAction::Transport(ConnectionAction::Open) => {
                        let followup = match self.driver.connect().await {
                            Ok(()) => ClientEvent::TransportOpened,
                            Err(err) => ClientEvent::TransportFailed { reason: err.to_string() },
                        };
                        events.push_back(followup);
                    },
                    ClientAction::Transport(ConnectionAction::Transmit(text)) => {
                        if let Err(err) = self.driver.send_text(text).await {
                            events.push_back(ClientEvent::TransportFailed {
                                reason: err.to_string(),
                            });
                        }
                    },
                    ClientAction::Transport(ConnectionAction::Close) => self.driver.close(),
                    ClientAction::Store(request) => self.pending.push_back(request),
                    ClientAction::Notice { level, message } => {
                        self.driver.notify(level, &message)?;
                    },
                }
            }
        }

        self.driver.render(&self.client)
    }
}
