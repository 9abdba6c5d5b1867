//! Per-session tracker state.

use crate::events::{status, EndReason};
use crate::path::Path;
use crate::position::Position;
use mura_env::SessionId;
use std::time::{Duration, SystemTime};

/// Session lifecycle.
///
/// ```text
/// Initializing --ViewReady--> Live --SessionEnd--> Ended
/// ```
///
/// There is no way back from `Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Live,
    Ended,
}

/// Everything the viewer knows about one session.
///
/// Only the reducer mutates it; everything outside reads through accessors.
/// The marker position and the path are independent: a snapshot moves the
/// marker, a history delivery rewrites the path.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    pub(crate) session: SessionId,
    pub(crate) phase: Phase,
    pub(crate) path: Path,
    pub(crate) current_position: Option<Position>,
    /// Where the map is currently centered
    pub(crate) view_center: Position,
    /// Set when the operator panned or pressed "center", until cleared
    pub(crate) manual_recenter: bool,
    pub(crate) status: &'static str,
    pub(crate) last_update: Option<SystemTime>,
    pub(crate) ended_at: Option<SystemTime>,
    pub(crate) end_reason: Option<EndReason>,
}

impl TrackerState {
    /// Fresh state for a session, centered on `origin` with an empty path.
    pub fn new(session: SessionId, origin: Position, max_path_len: usize) -> Self {
        Self {
            session,
            phase: Phase::Initializing,
            path: Path::new(max_path_len),
            current_position: None,
            view_center: origin,
            manual_recenter: false,
            status: status::CONNECTING,
            last_update: None,
            ended_at: None,
            end_reason: None,
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The marker: the most recently accepted position.
    pub fn current_position(&self) -> Option<Position> {
        self.current_position
    }

    pub fn view_center(&self) -> Position {
        self.view_center
    }

    pub fn manual_recenter(&self) -> bool {
        self.manual_recenter
    }

    /// The persistent status line (transient rejections are not stored).
    pub fn status(&self) -> &'static str {
        self.status
    }

    pub fn last_update(&self) -> Option<SystemTime> {
        self.last_update
    }

    pub fn ended_at(&self) -> Option<SystemTime> {
        self.ended_at
    }

    /// Why the session ended; the first `SessionEnd` wins.
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn is_live(&self) -> bool {
        self.phase == Phase::Live
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// Whether the last accepted update is older than `max_age`.
    ///
    /// A session that never received a position is stale. A clock that went
    /// backwards is not.
    pub fn is_stale(&self, now: SystemTime, max_age: Duration) -> bool {
        match self.last_update {
            None => true,
            Some(at) => now
                .duration_since(at)
                .map(|age| age > max_age)
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> TrackerState {
        TrackerState::new(SessionId::new("s1").unwrap(), Position::BOGOTA, 500)
    }

    #[test]
    fn test_new_state() {
        let s = state();
        assert_eq!(s.phase(), Phase::Initializing);
        assert_eq!(s.view_center(), Position::BOGOTA);
        assert!(s.current_position().is_none());
        assert!(s.path().is_empty());
        assert_eq!(s.path().max_len(), 500);
        assert_eq!(s.status(), "connecting");
    }

    #[test]
    fn test_staleness() {
        let mut s = state();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        assert!(s.is_stale(t0, Duration::from_secs(30)));

        s.last_update = Some(t0);
        assert!(!s.is_stale(t0 + Duration::from_secs(30), Duration::from_secs(30)));
        assert!(s.is_stale(t0 + Duration::from_secs(31), Duration::from_secs(30)));
        assert!(!s.is_stale(t0 - Duration::from_secs(5), Duration::from_secs(30)));
    }
}
