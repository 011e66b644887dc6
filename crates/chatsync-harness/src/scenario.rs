//! Scenario runner: one client, one in-memory store, one scripted driver.

use chatsync_app::{MemoryStore, Runtime};
use chatsync_client::{ClientIdentity, Environment, SyncConfig};

use crate::{InvariantRegistry, SimDriver, SimDriverError, SimEnv};

/// Runtime type produced by a scenario.
pub type SimRuntime = Runtime<SimDriver, MemoryStore, SimEnv>;

/// A fully deterministic session.
///
/// Seed the store, script the driver, then [`Scenario::run`] on a
/// single-threaded executor. The same seed and script always produce the
/// same frames, notices and final state.
pub struct Scenario {
    env: SimEnv,
    store: MemoryStore,
    driver: SimDriver,
    identity: ClientIdentity,
    config: SyncConfig,
}

impl Scenario {
    /// New scenario for `identity` with the standard invariants enabled.
    pub fn new(seed: u64, identity: ClientIdentity) -> Self {
        let env = SimEnv::with_seed(seed);
        let clock = env.clone();
        let store = MemoryStore::new().with_clock(move || clock.wall_clock());
        let driver = SimDriver::new(&env, &store).with_invariants(InvariantRegistry::standard());
        Self { env, store, driver, identity, config: SyncConfig::default() }
    }

    /// Override the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Make every connection attempt fail.
    #[must_use]
    pub fn refusing_connections(mut self) -> Self {
        self.driver = self.driver.refusing_connections();
        self
    }

    /// Simulation clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Store handle, for seeding and later inspection.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Driver, for scripting.
    pub fn driver_mut(&mut self) -> &mut SimDriver {
        &mut self.driver
    }

    /// Run the script to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if an invariant is violated or the executor cannot be
    /// built.
    pub fn run(self) -> Result<SimRuntime, SimDriverError> {
        let executor = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| SimDriverError(format!("executor: {e}")))?;
        let runtime = Runtime::new(self.driver, self.store, self.env, self.identity, self.config);
        executor.block_on(runtime.run())
    }
}
