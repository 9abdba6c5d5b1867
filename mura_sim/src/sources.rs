//! Simulated event sources.
//!
//! - `TickSource`: replays a route at a fixed cadence on the context clock,
//!   then reports `SessionEnd`
//! - `ScriptedSource`: yields a fixed list of events (and injected errors)
//!   in order, standing in for a remote listener

use crate::walk::Route;

use async_trait::async_trait;
use mura_core::{EndReason, Position, PositionEvent};
use mura_env::{EnvError, EventSource, ViewerContext};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Reference tick cadence of the simulated walk.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1200);

/// Feeds a route as `SimulatedTick`s, one per interval.
pub struct TickSource<Ctx: ViewerContext> {
    context: Arc<Ctx>,
    points: std::vec::IntoIter<Position>,
    interval: Duration,
    finished: bool,
}

impl<Ctx: ViewerContext> TickSource<Ctx> {
    pub fn new(context: Arc<Ctx>, route: Route, interval: Duration) -> Self {
        Self {
            context,
            points: route.into_points().into_iter(),
            interval,
            finished: false,
        }
    }

    /// Number of ticks still to be delivered.
    pub fn remaining(&self) -> usize {
        self.points.len()
    }
}

#[async_trait]
impl<Ctx: ViewerContext> EventSource<PositionEvent> for TickSource<Ctx> {
    async fn recv(&mut self) -> Result<Option<PositionEvent>, EnvError> {
        if self.finished {
            return Ok(None);
        }

        self.context.sleep(self.interval).await;

        match self.points.next() {
            Some(p) => Ok(Some(PositionEvent::tick(p))),
            None => {
                // Walk exhausted: the stream ends the session exactly once
                self.finished = true;
                Ok(Some(PositionEvent::end(EndReason::RouteFinished)))
            }
        }
    }

    fn label(&self) -> &str {
        "simulated-walk"
    }
}

/// Yields pre-recorded deliveries in order.
pub struct ScriptedSource {
    label: String,
    items: VecDeque<Result<PositionEvent, EnvError>>,
}

impl ScriptedSource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            items: VecDeque::new(),
        }
    }

    /// Appends an event.
    pub fn push(mut self, event: PositionEvent) -> Self {
        self.items.push_back(Ok(event));
        self
    }

    /// Appends several events.
    pub fn extend<I: IntoIterator<Item = PositionEvent>>(mut self, events: I) -> Self {
        self.items.extend(events.into_iter().map(Ok));
        self
    }

    /// Appends an upstream error.
    pub fn fail(mut self, error: EnvError) -> Self {
        self.items.push_back(Err(error));
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl EventSource<PositionEvent> for ScriptedSource {
    async fn recv(&mut self) -> Result<Option<PositionEvent>, EnvError> {
        tokio::task::yield_now().await;
        match self.items.pop_front() {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;

    #[tokio::test]
    async fn test_tick_source_cadence_and_end() {
        let ctx = SimContext::shared(1);
        let route = Route::from_deltas(Position::BOGOTA, &[(0.001, 0.0), (0.0, 0.001)]);
        let expected = route.points().to_vec();
        let mut source = TickSource::new(ctx.clone(), route, DEFAULT_TICK_INTERVAL);

        assert_eq!(source.recv().await, Ok(Some(PositionEvent::tick(expected[0]))));
        assert_eq!(ctx.now(), Duration::from_millis(1200));
        assert_eq!(source.recv().await, Ok(Some(PositionEvent::tick(expected[1]))));
        assert_eq!(source.remaining(), 0);

        assert_eq!(
            source.recv().await,
            Ok(Some(PositionEvent::end(EndReason::RouteFinished)))
        );
        assert_eq!(ctx.now(), Duration::from_millis(3600));
        assert_eq!(source.recv().await, Ok(None));
        assert_eq!(source.recv().await, Ok(None));
    }

    #[tokio::test]
    async fn test_scripted_source_order() {
        let mut source = ScriptedSource::new("snapshot")
            .push(PositionEvent::snapshot(Some(1.0), Some(2.0)))
            .fail(EnvError::unavailable("offline"))
            .push(PositionEvent::end(EndReason::Operator));
        assert_eq!(source.len(), 3);

        assert!(matches!(source.recv().await, Ok(Some(PositionEvent::RemoteSnapshot { .. }))));
        assert!(source.recv().await.is_err());
        assert_eq!(source.recv().await, Ok(Some(PositionEvent::end(EndReason::Operator))));
        assert_eq!(source.recv().await, Ok(None));
        assert!(source.is_empty());
    }
}
