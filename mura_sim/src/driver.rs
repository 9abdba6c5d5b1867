//! ViewerDriver - serializes event sources into the reducer.
//!
//! ```text
//!  TickSource ──┐
//!  Snapshot   ──┼──► mpsc ──► reduce() ──► RenderSink
//!  History    ──┘
//! ```
//!
//! Each source runs in its own task and forwards into one bounded channel.
//! The driver drains the channel one event at a time, so the reducer never
//! sees two events at once and no ordering between sources is assumed.

use crate::sink::{Applied, RenderSink};

use mura_core::{status, PositionEvent, PositionStreamReducer, RenderCommand, TrackerState};
use mura_env::{EnvError, EventSource, ViewerContext};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Default capacity of the delivery channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Counters collected while driving a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStats {
    /// Events delivered to the reducer
    pub events: u64,

    /// Positions accepted (marker moved)
    pub accepted: u64,

    /// Commands that moved the view
    pub recenters: u64,

    /// Reports rejected as invalid
    pub rejected: u64,

    /// Events dropped before the view was ready
    pub not_ready: u64,

    /// History deliveries applied
    pub history_replacements: u64,

    /// Subscription errors surfaced
    pub source_errors: u64,

    /// Operator actions applied (recenter, pan, clear)
    pub operator_actions: u64,

    /// Events ignored (`NoOp`)
    pub ignored: u64,
}

impl DriverStats {
    fn record(&mut self, event: &str, command: &RenderCommand) {
        self.events += 1;
        if command.recenters() {
            self.recenters += 1;
        }
        match command {
            RenderCommand::ShowStatus { message, .. } if message == status::NOT_READY => {
                self.not_ready += 1
            }
            RenderCommand::ShowStatus { message, .. }
                if message.starts_with(status::SOURCE_UNAVAILABLE) =>
            {
                self.source_errors += 1
            }
            RenderCommand::MoveMarkerAndMaybeRecenter { .. } => self.accepted += 1,
            RenderCommand::ReplacePath { .. } => self.history_replacements += 1,
            _ if is_operator_event(event) => self.operator_actions += 1,
            RenderCommand::ShowStatus { message, .. } if message == status::WAITING_FOR_LOCATION => {
                self.rejected += 1
            }
            RenderCommand::NoOp => self.ignored += 1,
            RenderCommand::RecenterOn { .. } | RenderCommand::ShowStatus { .. } => {}
        }
    }
}

fn is_operator_event(kind: &str) -> bool {
    matches!(kind, "manual_recenter" | "view_panned" | "clear_manual_recenter")
}

/// Outcome of a driven session.
#[derive(Debug, Clone)]
pub struct DriverReport {
    /// State after the last event
    pub state: TrackerState,

    pub stats: DriverStats,

    /// Context clock when the last source closed
    pub elapsed: Duration,

    /// Seed of the context the session ran on (0 on the real clock)
    pub seed: u64,
}

/// Runs one viewing session: sources in, commands out.
pub struct ViewerDriver<Ctx: ViewerContext> {
    reducer: PositionStreamReducer<Ctx>,
    state: TrackerState,
    tx: mpsc::Sender<PositionEvent>,
    rx: mpsc::Receiver<PositionEvent>,
    sources: usize,
    ready_on_start: bool,
}

impl<Ctx: ViewerContext> ViewerDriver<Ctx> {
    /// Creates a driver for an opened session.
    pub fn new(reducer: PositionStreamReducer<Ctx>, state: TrackerState) -> Self {
        let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            reducer,
            state,
            tx,
            rx,
            sources: 0,
            ready_on_start: false,
        }
    }

    /// Applies `ViewReady` before the first delivered event, as if the map
    /// finished loading immediately.
    pub fn ready_on_start(mut self) -> Self {
        self.ready_on_start = true;
        self
    }

    /// Number of attached sources.
    pub fn source_count(&self) -> usize {
        self.sources
    }

    /// Spawns a task forwarding a source into the driver.
    ///
    /// Source errors are forwarded as `SourceFailed`; the source keeps being
    /// polled until it reports `Ok(None)`.
    pub fn attach<S>(&mut self, source: S)
    where
        S: EventSource<PositionEvent>,
    {
        let tx = self.tx.clone();
        self.sources += 1;

        tokio::spawn(async move {
            let label = source.label().to_string();
            debug!(source = %label, "source attached");
            match forward(source, tx).await {
                Ok(()) => debug!(source = %label, "source closed"),
                Err(e) => debug!(source = %label, error = %e, "source stopped early"),
            }
        });
    }

    /// Drains every source into the reducer until all of them close.
    pub async fn run<S: RenderSink>(self, sink: &mut S) -> DriverReport {
        let Self {
            reducer,
            mut state,
            tx,
            mut rx,
            sources,
            ready_on_start,
        } = self;
        // Only the source tasks hold senders from here on
        drop(tx);

        let seed = reducer.context().seed();
        info!(
            session = %state.session(),
            sources,
            seed,
            mode = %reducer.config().recenter,
            "driving session"
        );

        let mut stats = DriverStats::default();

        if ready_on_start {
            state = step(&reducer, state, PositionEvent::ViewReady, &mut stats, sink);
        }

        while let Some(event) = rx.recv().await {
            state = step(&reducer, state, event, &mut stats, sink);
        }

        let elapsed = reducer.context().now();
        info!(
            session = %state.session(),
            events = stats.events,
            accepted = stats.accepted,
            path_len = state.path().len(),
            "all sources closed"
        );

        DriverReport {
            state,
            stats,
            elapsed,
            seed,
        }
    }
}

/// Pumps one source into the driver until it closes.
///
/// Source errors are forwarded as `SourceFailed`. Fails with
/// `ChannelClosed` if the driver stopped listening first.
async fn forward<S>(mut source: S, tx: mpsc::Sender<PositionEvent>) -> Result<(), EnvError>
where
    S: EventSource<PositionEvent>,
{
    loop {
        let event = match source.recv().await {
            Ok(Some(event)) => event,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!(source = %source.label(), error = %e, "source error");
                let reason = match e {
                    EnvError::SourceUnavailable(msg) => msg,
                    other => other.to_string(),
                };
                PositionEvent::SourceFailed { reason }
            }
        };
        tx.send(event)
            .await
            .map_err(|_| EnvError::closed(source.label()))?;
    }
}

fn step<Ctx: ViewerContext, S: RenderSink>(
    reducer: &PositionStreamReducer<Ctx>,
    state: TrackerState,
    event: PositionEvent,
    stats: &mut DriverStats,
    sink: &mut S,
) -> TrackerState {
    let kind = event.kind();
    let (state, command) = reducer.reduce(state, event);
    stats.record(kind, &command);
    sink.apply(&Applied {
        elapsed: reducer.context().now(),
        event: kind,
        command: &command,
        state: &state,
    });
    state
}
