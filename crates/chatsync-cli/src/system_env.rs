//! Wall-clock environment backed by tokio timers and the OS RNG.
//!
//! `SystemEnv` uses real monotonic and wall-clock time, OS randomness
//! (getrandom) for group room ids, and tokio sleeps for the tick timer.
//! Behavior is not reproducible; tests use the simulated environment.

use std::time::Duration;

use chatsync_core::Environment;
use chrono::{DateTime, Utc};

/// Production environment using system time and OS randomness.
///
/// # Panics
///
/// Panics if the OS RNG fails. Group room ids are derived from it, and a
/// client that cannot produce unique ids must not create rooms.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Environment reading the system clocks.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
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

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}
