//! Simulated environment: virtual time and seeded randomness.
//!
//! `SimEnv` makes every run reproducible. Monotonic time is a virtual offset
//! that only moves when the harness (or a runtime sleep) advances it, the
//! wall clock is a fixed epoch plus that offset, and randomness comes from a
//! seeded ChaCha stream.

use std::{
    ops::{Add, Sub},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chatsync_core::Environment;
use chrono::{DateTime, TimeZone, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall-clock time at virtual offset zero (2024-01-01T00:00:00Z).
pub const SIM_EPOCH_SECS: i64 = 1_704_067_200;

/// Virtual monotonic instant: time elapsed since the simulation started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Simulation start.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Instant `millis` after the start.
    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Offset from the start.
    pub fn since_start(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    /// Saturates at zero, like `std::time::Instant`.
    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

struct SimState {
    elapsed: Duration,
    epoch: DateTime<Utc>,
    rng: ChaCha8Rng,
}

/// Deterministic [`Environment`] for simulation.
///
/// Clones share the clock and the RNG stream.
#[derive(Clone)]
pub struct SimEnv {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl SimEnv {
    /// Environment whose random stream is derived from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        let epoch = Utc.timestamp_opt(SIM_EPOCH_SECS, 0).single().unwrap_or_default();
        Self {
            state: Arc::new(Mutex::new(SimState {
                elapsed: Duration::ZERO,
                epoch,
                rng: ChaCha8Rng::seed_from_u64(seed),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the wall clock's origin. Monotonic time is unaffected.
    #[must_use]
    pub fn with_epoch(self, epoch: DateTime<Utc>) -> Self {
        self.lock().epoch = epoch;
        self
    }

    /// Advance virtual time.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.elapsed += duration;
        tracing::trace!(elapsed_ms = state.elapsed.as_millis(), "virtual time advanced");
    }

    /// Virtual time elapsed since the start.
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.lock().elapsed)
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        let state = self.lock();
        let offset = chrono::Duration::from_std(state.elapsed).unwrap_or_else(|_| chrono::Duration::zero());
        state.epoch + offset
    }

    /// Completes immediately after advancing virtual time by `duration`.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        let env = self.clone();
        async move { env.advance(duration) }
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.lock().rng.fill_bytes(buffer);
    }
}
