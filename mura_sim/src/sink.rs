//! Presentation sinks: where render commands end up.

use mura_core::{status, EndReason, Phase, Position, RenderCommand, TrackerState};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// One reducer step as seen by a sink.
pub struct Applied<'a> {
    /// Context clock when the step was applied
    pub elapsed: Duration,

    /// Kind of the event that produced the command
    pub event: &'static str,

    pub command: &'a RenderCommand,

    /// State after the step
    pub state: &'a TrackerState,
}

/// Stand-in for the map widget and status line.
pub trait RenderSink: Send {
    fn apply(&mut self, applied: &Applied<'_>);
}

/// Logs every command through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl RenderSink for LogSink {
    fn apply(&mut self, applied: &Applied<'_>) {
        let t = applied.elapsed.as_secs_f64();
        match applied.command {
            RenderCommand::MoveMarkerAndMaybeRecenter { position, should_recenter } => {
                info!(
                    "t={:.1}s marker -> ({:.6}, {:.6}){}",
                    t,
                    position.lat,
                    position.lng,
                    if *should_recenter { " [recenter]" } else { "" }
                );
            }
            RenderCommand::ReplacePath { positions } => {
                info!("t={:.1}s path replaced ({} points)", t, positions.len());
            }
            RenderCommand::RecenterOn { position } => {
                info!("t={:.1}s recenter on ({:.6}, {:.6})", t, position.lat, position.lng);
            }
            RenderCommand::ShowStatus { message, .. } => match applied.state.end_reason() {
                Some(reason) if message == status::SESSION_ENDED => {
                    info!("t={:.1}s status: {} ({})", t, message, reason.describe());
                }
                _ => info!("t={:.1}s status: {}", t, message),
            },
            RenderCommand::NoOp => {
                debug!("t={:.1}s {} ignored", t, applied.event);
            }
        }
    }
}

/// A recorded step, enough to check invariants after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedStep {
    pub elapsed_ms: u64,
    pub event: String,
    pub command: RenderCommand,
    pub view_center: Position,
    pub marker: Option<Position>,
    pub path_len: usize,
    pub ended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReason>,
}

/// Keeps every step in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    steps: Vec<RecordedStep>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[RecordedStep] {
        &self.steps
    }

    pub fn commands(&self) -> impl Iterator<Item = &RenderCommand> {
        self.steps.iter().map(|s| &s.command)
    }

    pub fn into_steps(self) -> Vec<RecordedStep> {
        self.steps
    }
}

impl RenderSink for RecordingSink {
    fn apply(&mut self, applied: &Applied<'_>) {
        self.steps.push(RecordedStep {
            elapsed_ms: applied.elapsed.as_millis() as u64,
            event: applied.event.to_string(),
            command: applied.command.clone(),
            view_center: applied.state.view_center(),
            marker: applied.state.current_position(),
            path_len: applied.state.path().len(),
            ended: applied.state.phase() == Phase::Ended,
            end_reason: applied.state.end_reason(),
        });
    }
}

/// Fans each step out to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: RenderSink, B: RenderSink> RenderSink for Tee<A, B> {
    fn apply(&mut self, applied: &Applied<'_>) {
        self.0.apply(applied);
        self.1.apply(applied);
    }
}
