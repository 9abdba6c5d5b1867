//! Reducer input events, output commands and status lines.

use crate::position::{Position, PositionError, RawPosition, RawSnapshot};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use thiserror::Error;

/// Status lines shown to the viewer.
pub mod status {
    /// Session opened, view not set up yet.
    pub const CONNECTING: &str = "connecting";
    /// View ready, no position received yet.
    pub const LIVE: &str = "live";
    /// At least one position accepted.
    pub const UPDATED: &str = "updated";
    /// Report rejected (missing or out-of-range coordinates).
    pub const WAITING_FOR_LOCATION: &str = "waiting for location";
    /// Event arrived before the view was ready.
    pub const NOT_READY: &str = "not ready";
    /// Terminal status after `SessionEnd`.
    pub const SESSION_ENDED: &str = "session ended";
    /// Link carried no usable session id.
    pub const INVALID_LINK: &str = "invalid link";
    /// Prefix for subscription failures.
    pub const SOURCE_UNAVAILABLE: &str = "source unavailable";
}

/// Everything that can happen to a viewing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PositionEvent {
    /// The map widget finished its setup; the session goes live.
    ViewReady,

    /// One step of the simulated walk.
    SimulatedTick { position: Position },

    /// The remote session document changed. Untrusted.
    RemoteSnapshot { snapshot: RawSnapshot },

    /// A complete delivery of the remote history query (ascending by `ts`).
    RemoteHistory { records: Vec<RawPosition> },

    /// Operator pressed "center".
    ManualRecenter,

    /// Operator panned or zoomed the map to a new center.
    ViewPanned { center: Position },

    /// Operator re-enabled automatic behaviour after panning.
    ClearManualRecenter,

    /// A subscription reported an error.
    SourceFailed { reason: String },

    /// Operator ended the session, or the simulated walk ran out.
    SessionEnd {
        #[serde(default)]
        reason: EndReason,
    },
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The operator pressed "end".
    #[default]
    Operator,

    /// The simulated walk ran out of points.
    RouteFinished,
}

impl EndReason {
    /// Detail shown next to the "session ended" status.
    pub fn describe(&self) -> &'static str {
        match self {
            EndReason::Operator => "ended by the operator",
            EndReason::RouteFinished => "simulated route finished",
        }
    }
}

impl PositionEvent {
    pub fn tick(position: Position) -> Self {
        PositionEvent::SimulatedTick { position }
    }

    pub fn snapshot(last_lat: Option<f64>, last_lng: Option<f64>) -> Self {
        PositionEvent::RemoteSnapshot {
            snapshot: RawSnapshot::new(last_lat, last_lng),
        }
    }

    pub fn history(records: Vec<RawPosition>) -> Self {
        PositionEvent::RemoteHistory { records }
    }

    pub fn end(reason: EndReason) -> Self {
        PositionEvent::SessionEnd { reason }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PositionEvent::ViewReady => "view_ready",
            PositionEvent::SimulatedTick { .. } => "simulated_tick",
            PositionEvent::RemoteSnapshot { .. } => "remote_snapshot",
            PositionEvent::RemoteHistory { .. } => "remote_history",
            PositionEvent::ManualRecenter => "manual_recenter",
            PositionEvent::ViewPanned { .. } => "view_panned",
            PositionEvent::ClearManualRecenter => "clear_manual_recenter",
            PositionEvent::SourceFailed { .. } => "source_failed",
            PositionEvent::SessionEnd { .. } => "session_end",
        }
    }
}

/// What the presentation layer should do after an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RenderCommand {
    MoveMarkerAndMaybeRecenter {
        position: Position,
        should_recenter: bool,
    },
    ReplacePath {
        positions: Vec<Position>,
    },
    RecenterOn {
        position: Position,
    },
    ShowStatus {
        message: String,
        at: SystemTime,
    },
    NoOp,
}

impl RenderCommand {
    pub fn status(message: impl Into<String>, at: SystemTime) -> Self {
        RenderCommand::ShowStatus {
            message: message.into(),
            at,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, RenderCommand::NoOp)
    }

    /// Returns the status text if this is a `ShowStatus`.
    pub fn status_message(&self) -> Option<&str> {
        match self {
            RenderCommand::ShowStatus { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether this command moves the view.
    pub fn recenters(&self) -> bool {
        matches!(
            self,
            RenderCommand::RecenterOn { .. }
                | RenderCommand::MoveMarkerAndMaybeRecenter {
                    should_recenter: true,
                    ..
                }
        )
    }
}

/// Recoverable conditions the reducer reports as status lines.
///
/// None of these are fatal: each becomes a `ShowStatus` and the state is
/// left as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] PositionError),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("event `{0}` arrived before the view was ready")]
    NotReady(&'static str),
}

impl ViewerError {
    /// The text shown to the viewer for this condition.
    pub fn status_message(&self) -> String {
        match self {
            ViewerError::InvalidPosition(_) => status::WAITING_FOR_LOCATION.to_string(),
            ViewerError::SourceUnavailable(reason) => {
                format!("{}: {}", status::SOURCE_UNAVAILABLE, reason)
            }
            ViewerError::NotReady(_) => status::NOT_READY.to_string(),
        }
    }

    pub fn to_command(&self, at: SystemTime) -> RenderCommand {
        RenderCommand::status(self.status_message(), at)
    }
}
