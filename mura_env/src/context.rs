//! Clock context trait for the viewer.

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// The viewer's window onto time.
///
/// The reducer only ever asks for `system_time()` (status timestamps and
/// staleness). Sources use `sleep()` to pace their ticks.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time` and the system clock
/// - **Simulation**: `SimContext` (in `mura_sim`) - virtual clock, sleep advances it
#[async_trait]
pub trait ViewerContext: Send + Sync + 'static {
    /// Returns the monotonic time since context creation.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time used to stamp status lines.
    ///
    /// In simulation, this is the virtual clock plus a fixed epoch.
    fn system_time(&self) -> SystemTime;

    /// Suspends the caller for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Returns the context's seed (0 when not seeded).
    fn seed(&self) -> u64;
}
