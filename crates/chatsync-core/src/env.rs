//! Clock, timer and randomness seam shared by production and simulation.
//!
//! Decouples synchronization logic from system resources (monotonic time,
//! wall-clock time, randomness). Production uses the system clock and OS
//! entropy; simulation uses a virtual clock and a seeded RNG so that every
//! typing expiry and generated room id is reproducible.

use std::{
    ops::{Add, Sub},
    time::Duration,
};

use chatsync_proto::RoomId;
use chrono::{DateTime, Utc};

/// Abstract environment providing time and randomness.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `wall_clock()` is the UTC time corresponding to `now()`
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic instant type.
    ///
    /// Production environments use `std::time::Instant`, simulation uses a
    /// virtual instant advanced by the harness.
    type Instant: Copy
        + Ord
        + Send
        + Sync
        + std::fmt::Debug
        + Sub<Output = Duration>
        + Add<Duration, Output = Self::Instant>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Current wall-clock time, used to stamp outgoing messages and render
    /// display times.
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this; state machines take time as input.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// Given the same seed, a simulated environment produces the same
    /// sequence.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a fresh group room id.
    fn random_room_id(&self) -> RoomId {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        RoomId::group_from_random(bytes)
    }
}
