//! Real-time `ViewerContext` on the Tokio timer and the system clock.

use crate::ViewerContext;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Wall-clock context for live viewing and `--realtime` runs.
///
/// Status timestamps come straight from the system clock; elapsed time is
/// measured from construction on the monotonic clock, so a wall-clock jump
/// never reorders ticks.
#[derive(Debug, Clone, Copy)]
pub struct TokioContext {
    opened: Instant,
    opened_at: SystemTime,
}

impl TokioContext {
    pub fn new() -> Self {
        Self {
            opened: Instant::now(),
            opened_at: SystemTime::now(),
        }
    }

    /// Shared handle for the reducer and every source task.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Wall-clock time the context was created.
    pub fn opened_at(&self) -> SystemTime {
        self.opened_at
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ViewerContext for TokioContext {
    fn now(&self) -> Duration {
        self.opened.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Live sessions are not replayable.
    fn seed(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sleep_waits_on_real_clock() {
        let ctx = TokioContext::new();
        let before = ctx.now();
        ctx.sleep(Duration::from_millis(15)).await;

        assert!(ctx.now() - before >= Duration::from_millis(15));
        assert!(ctx.system_time() >= ctx.opened_at());
    }

    #[test]
    fn test_live_context_is_unseeded() {
        assert_eq!(TokioContext::shared().seed(), 0);
    }
}
