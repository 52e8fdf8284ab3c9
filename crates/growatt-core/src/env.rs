//! Environment abstraction for deterministic testing.
//!
//! Decouples timestamp formatting and idle-timeout logic from the system
//! clock, so control-channel and session tests can run against a fixed
//! clock instead of real time.

use std::time::Duration;

/// Abstract environment providing monotonic time and an async sleep
/// primitive.
///
/// No RNG surface is exposed: nothing in this crate needs randomness — the
/// packet builder's sequence number is fixed, not random (see
/// `growatt_proto::builder`).
///
/// # Invariants
///
/// - `now()` never goes backwards within a single execution context.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be
    /// used by driver code (not protocol logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Current wall-clock time in seconds since the Unix epoch, used as
    /// the fallback when a frame's embedded timestamp fails to parse.
    fn wall_clock_secs(&self) -> u64;
}
