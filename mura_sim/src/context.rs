//! Virtual-clock `ViewerContext` for replayable viewer runs.

use async_trait::async_trait;
use mura_env::ViewerContext;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// 2024-01-01T00:00:00Z, where every run's wall clock starts.
const DEFAULT_EPOCH_SECS: u64 = 1_704_067_200;

/// Viewer context on a virtual clock.
///
/// `sleep` returns immediately after advancing the clock, so a 40-tick walk
/// at 1.2s cadence runs in microseconds and always stamps the same times.
/// Clones share the clock.
#[derive(Debug, Clone)]
pub struct SimContext {
    seed: u64,
    elapsed_ns: Arc<AtomicU64>,
    epoch: SystemTime,
}

impl SimContext {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            elapsed_ns: Arc::new(AtomicU64::new(0)),
            epoch: UNIX_EPOCH + Duration::from_secs(DEFAULT_EPOCH_SECS),
        }
    }

    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Moves the wall clock that elapsed time 0 maps to.
    pub fn with_epoch(mut self, epoch: SystemTime) -> Self {
        self.epoch = epoch;
        self
    }

    /// Moves the clock forward without yielding.
    pub fn advance_time(&self, by: Duration) {
        self.elapsed_ns.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn time_ns(&self) -> u64 {
        self.elapsed_ns.load(Ordering::SeqCst)
    }

    pub fn epoch(&self) -> SystemTime {
        self.epoch
    }
}

#[async_trait]
impl ViewerContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    fn system_time(&self) -> SystemTime {
        self.epoch + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance_time(duration);
        // Let other sources run between ticks
        tokio::task::yield_now().await;
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_times_follow_virtual_clock() {
        let ctx = SimContext::new(42);
        assert_eq!(ctx.now(), Duration::ZERO);
        assert_eq!(ctx.system_time(), ctx.epoch());

        ctx.advance_time(Duration::from_millis(1500));
        assert_eq!(ctx.now(), Duration::from_millis(1500));
        assert_eq!(ctx.system_time(), ctx.epoch() + Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_sleep_advances_virtual_clock() {
        let ctx = SimContext::new(7);
        ctx.sleep(Duration::from_millis(1200)).await;
        ctx.sleep(Duration::from_millis(1200)).await;
        assert_eq!(ctx.now(), Duration::from_millis(2400));
    }

    #[test]
    fn test_clones_share_clock() {
        let source_ctx = SimContext::new(42).with_epoch(UNIX_EPOCH);
        let reducer_ctx = source_ctx.clone();

        source_ctx.advance_time(Duration::from_secs(5));

        assert_eq!(reducer_ctx.system_time(), UNIX_EPOCH + Duration::from_secs(5));
        assert_eq!(reducer_ctx.seed(), 42);
    }
}
