//! The position stream reducer.
//!
//! Turns one `PositionEvent` at a time into an updated `TrackerState` and a
//! single `RenderCommand`:
//!
//! ```text
//!   (state, event, now) ──► reduce_at ──► (state', command)
//! ```
//!
//! `reduce_at` is a pure function of its inputs; `PositionStreamReducer`
//! wraps it with a config and a clock so callers do not thread `now` around.
//! Malformed input never panics: it becomes a status command and the state
//! comes back untouched.

use crate::events::{status, PositionEvent, RenderCommand, ViewerError};
use crate::path::DEFAULT_MAX_PATH_LEN;
use crate::position::{Position, PositionError, RawPosition};
use crate::recenter::RecenterPolicy;
use crate::tracker::{Phase, TrackerState};

use mura_env::{SessionId, SessionLink, ViewerContext};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Per-session viewer configuration, fixed when the session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Path history cap (default: 500, the remote query limit)
    pub max_path_len: usize,

    /// Follow or free-roam (default: follow)
    pub recenter: RecenterPolicy,

    /// Initial map center (default: Bogotá)
    pub origin: Position,

    /// Age after which the last update counts as stale (default: 30s)
    pub stale_after: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_path_len: DEFAULT_MAX_PATH_LEN,
            recenter: RecenterPolicy::default(),
            origin: Position::BOGOTA,
            stale_after: Duration::from_secs(30),
        }
    }
}

impl ViewerConfig {
    pub fn with_recenter(mut self, recenter: RecenterPolicy) -> Self {
        self.recenter = recenter;
        self
    }

    pub fn with_max_path_len(mut self, max_path_len: usize) -> Self {
        self.max_path_len = max_path_len;
        self
    }

    pub fn with_origin(mut self, origin: Position) -> Self {
        self.origin = origin;
        self
    }

    /// Fresh tracker state for a session under this config.
    pub fn new_state(&self, session: SessionId) -> TrackerState {
        TrackerState::new(session, self.origin, self.max_path_len)
    }
}

/// Result of opening a share link.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStart {
    /// The link names a session; events can be attached.
    Tracking(TrackerState),

    /// The link is unusable; show this and attach nothing.
    Rejected(RenderCommand),
}

/// Opens a share link.
pub fn open_session(config: &ViewerConfig, link: &SessionLink, now: SystemTime) -> SessionStart {
    match link {
        SessionLink::Valid(id) => {
            info!(session = %id, mode = %config.recenter, "opening session");
            SessionStart::Tracking(config.new_state(id.clone()))
        }
        SessionLink::Invalid(reason) => {
            warn!(%reason, "rejecting share link");
            SessionStart::Rejected(RenderCommand::status(status::INVALID_LINK, now))
        }
    }
}

// ============================================================================
// REDUCER
// ============================================================================

/// Applies one event to the state.
pub fn reduce_at(
    config: &ViewerConfig,
    state: TrackerState,
    event: PositionEvent,
    now: SystemTime,
) -> (TrackerState, RenderCommand) {
    match state.phase {
        Phase::Initializing => reduce_initializing(state, event, now),
        Phase::Live => reduce_live(config, state, event, now),
        Phase::Ended => reduce_ended(state, event, now),
    }
}

fn reduce_initializing(
    mut state: TrackerState,
    event: PositionEvent,
    now: SystemTime,
) -> (TrackerState, RenderCommand) {
    match event {
        PositionEvent::ViewReady => {
            state.phase = Phase::Live;
            state.status = status::LIVE;
            info!(session = %state.session, "view ready, session live");
            (state, RenderCommand::status(status::LIVE, now))
        }
        // Dropped, not buffered
        other => {
            let err = ViewerError::NotReady(other.kind());
            debug!(session = %state.session, %err, "dropping event");
            let command = err.to_command(now);
            (state, command)
        }
    }
}

fn reduce_live(
    config: &ViewerConfig,
    mut state: TrackerState,
    event: PositionEvent,
    now: SystemTime,
) -> (TrackerState, RenderCommand) {
    match event {
        PositionEvent::SimulatedTick { position } => {
            let candidate = position.validate().map(|_| position);
            accept(config, state, candidate, now)
        }
        PositionEvent::RemoteSnapshot { snapshot } => {
            accept(config, state, snapshot.to_position(), now)
        }
        PositionEvent::RemoteHistory { records } => replace_history(state, &records),
        PositionEvent::ManualRecenter => manual_recenter(state, now),
        PositionEvent::ViewPanned { center } => pan(state, center),
        PositionEvent::ClearManualRecenter => {
            state.manual_recenter = false;
            (state, RenderCommand::NoOp)
        }
        PositionEvent::SourceFailed { reason } => {
            let err = ViewerError::SourceUnavailable(reason);
            warn!(session = %state.session, %err, "subscription error");
            let command = err.to_command(now);
            (state, command)
        }
        PositionEvent::SessionEnd { reason } => {
            state.phase = Phase::Ended;
            state.status = status::SESSION_ENDED;
            state.ended_at = Some(now);
            state.end_reason = Some(reason);
            info!(
                session = %state.session,
                path_len = state.path.len(),
                reason = reason.describe(),
                "session ended"
            );
            (state, RenderCommand::status(status::SESSION_ENDED, now))
        }
        PositionEvent::ViewReady => (state, RenderCommand::NoOp),
    }
}

/// After `SessionEnd` the listeners may still deliver, but nothing they
/// deliver reaches the view. The map itself stays interactive.
fn reduce_ended(
    mut state: TrackerState,
    event: PositionEvent,
    now: SystemTime,
) -> (TrackerState, RenderCommand) {
    match event {
        PositionEvent::SessionEnd { .. } => {
            let at = state.ended_at.unwrap_or(now);
            (state, RenderCommand::status(status::SESSION_ENDED, at))
        }
        PositionEvent::ManualRecenter => manual_recenter(state, now),
        PositionEvent::ViewPanned { center } => pan(state, center),
        PositionEvent::ClearManualRecenter => {
            state.manual_recenter = false;
            (state, RenderCommand::NoOp)
        }
        other => {
            debug!(session = %state.session, kind = other.kind(), "session ended, ignoring");
            (state, RenderCommand::NoOp)
        }
    }
}

fn accept(
    config: &ViewerConfig,
    mut state: TrackerState,
    candidate: Result<Position, PositionError>,
    now: SystemTime,
) -> (TrackerState, RenderCommand) {
    let position = match candidate {
        Ok(p) => p,
        Err(e) => {
            let err = ViewerError::from(e);
            debug!(session = %state.session, %err, "rejecting position");
            let command = err.to_command(now);
            return (state, command);
        }
    };

    let should_recenter = config.recenter.should_recenter(&state.view_center, &position);

    state.current_position = Some(position);
    state.path.push(position);
    state.last_update = Some(now);
    state.status = status::UPDATED;

    if should_recenter {
        state.view_center = position;
        // Follow overrides whatever the operator did last
        if config.recenter.is_follow() {
            state.manual_recenter = false;
        }
    }

    (
        state,
        RenderCommand::MoveMarkerAndMaybeRecenter {
            position,
            should_recenter,
        },
    )
}

fn replace_history(mut state: TrackerState, records: &[RawPosition]) -> (TrackerState, RenderCommand) {
    let mut skipped = 0usize;
    let valid: Vec<Position> = records
        .iter()
        .filter_map(|r| match r.to_position() {
            Ok(p) => Some(p),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();

    state.path.replace(valid);
    debug!(
        session = %state.session,
        received = records.len(),
        skipped,
        kept = state.path.len(),
        "history replaced"
    );

    let positions = state.path.to_vec();
    (state, RenderCommand::ReplacePath { positions })
}

fn manual_recenter(mut state: TrackerState, now: SystemTime) -> (TrackerState, RenderCommand) {
    match state.current_position {
        Some(position) => {
            state.manual_recenter = true;
            state.view_center = position;
            (state, RenderCommand::RecenterOn { position })
        }
        None => (state, RenderCommand::status(status::WAITING_FOR_LOCATION, now)),
    }
}

fn pan(mut state: TrackerState, center: Position) -> (TrackerState, RenderCommand) {
    if let Err(e) = center.validate() {
        debug!(session = %state.session, error = %e, "ignoring pan to invalid center");
        return (state, RenderCommand::NoOp);
    }
    state.view_center = center;
    state.manual_recenter = true;
    (state, RenderCommand::NoOp)
}

// ============================================================================
// CLOCKED WRAPPER
// ============================================================================

/// The reducer bound to a config and a clock.
///
/// Generic over the context so the same reducer runs against the system
/// clock or a virtual one.
pub struct PositionStreamReducer<Ctx: ViewerContext> {
    config: ViewerConfig,
    context: Arc<Ctx>,
}

impl<Ctx: ViewerContext> PositionStreamReducer<Ctx> {
    pub fn new(config: ViewerConfig, context: Arc<Ctx>) -> Self {
        Self { config, context }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<Ctx> {
        &self.context
    }

    /// Opens a share link at the current time.
    pub fn open(&self, link: &SessionLink) -> SessionStart {
        open_session(&self.config, link, self.context.system_time())
    }

    /// Applies one event at the current time.
    pub fn reduce(&self, state: TrackerState, event: PositionEvent) -> (TrackerState, RenderCommand) {
        reduce_at(&self.config, state, event, self.context.system_time())
    }

    /// Whether the session has gone quiet for longer than `stale_after`.
    pub fn is_stale(&self, state: &TrackerState) -> bool {
        state.is_stale(self.context.system_time(), self.config.stale_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EndReason;
    use mura_env::TokioContext;
    use proptest::prelude::*;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_704_067_200)
    }

    fn live(config: &ViewerConfig) -> TrackerState {
        let state = config.new_state(SessionId::new("ride-42").unwrap());
        let (state, command) = reduce_at(config, state, PositionEvent::ViewReady, now());
        assert_eq!(command, RenderCommand::status("live", now()));
        state
    }

    fn apply(config: &ViewerConfig, state: TrackerState, event: PositionEvent) -> (TrackerState, RenderCommand) {
        reduce_at(config, state, event, now())
    }

    #[test]
    fn test_simulated_walk_scenario() {
        let config = ViewerConfig::default();
        let mut state = live(&config);

        let origin = Position::new(4.7110, -74.0721).unwrap();
        let p1 = origin.offset(0.001, 0.001);
        let p2 = p1.offset(-0.002, 0.0);
        let p3 = p2.offset(0.0, 0.0015);

        for p in [p1, p2, p3] {
            let (next, command) = apply(&config, state, PositionEvent::tick(p));
            assert!(matches!(
                command,
                RenderCommand::MoveMarkerAndMaybeRecenter { position, .. } if position == p
            ));
            state = next;
        }

        assert_eq!(state.path().to_vec(), vec![p1, p2, p3]);
        assert_eq!(state.current_position(), Some(p3));
        assert_eq!(state.status(), "updated");
    }

    #[test]
    fn test_partial_snapshot_is_rejected() {
        let config = ViewerConfig::default();
        let state = live(&config);
        let before = state.clone();

        let (state, command) = apply(&config, state, PositionEvent::snapshot(Some(10.0), None));

        assert_eq!(command, RenderCommand::status("waiting for location", now()));
        assert_eq!(state, before);
    }

    #[test]
    fn test_zero_coordinates_are_a_real_position() {
        let config = ViewerConfig::default();
        let state = live(&config);

        let (state, _) = apply(&config, state, PositionEvent::snapshot(Some(0.0), Some(0.0)));
        assert_eq!(state.current_position(), Some(Position::new(0.0, 0.0).unwrap()));
    }

    #[test]
    fn test_session_end_then_snapshot_is_ignored() {
        let config = ViewerConfig::default();
        let state = live(&config);
        let (state, _) = apply(&config, state, PositionEvent::snapshot(Some(4.7), Some(-74.0)));
        let marker = state.current_position();

        let (state, command) = apply(&config, state, PositionEvent::end(EndReason::Operator));
        assert_eq!(command.status_message(), Some("session ended"));

        let (state, command) = apply(&config, state, PositionEvent::snapshot(Some(1.0), Some(1.0)));
        assert_eq!(command, RenderCommand::NoOp);
        assert_eq!(state.status(), "session ended");
        assert_eq!(state.current_position(), marker);
        assert!(state.is_ended());
    }

    #[test]
    fn test_session_end_is_idempotent() {
        let config = ViewerConfig::default();
        let state = live(&config);
        let (state, _) = apply(&config, state, PositionEvent::tick(Position::BOGOTA));

        let (state, first) = reduce_at(&config, state, PositionEvent::end(EndReason::Operator), now());
        let path_after_first = state.path().clone();

        let later = now() + Duration::from_secs(60);
        let (state, second) = reduce_at(&config, state, PositionEvent::end(EndReason::Operator), later);

        assert_eq!(first, second);
        assert_eq!(state.path(), &path_after_first);
        assert_eq!(state.ended_at(), Some(now()));
    }

    #[test]
    fn test_first_end_reason_is_kept() {
        let config = ViewerConfig::default();
        let state = live(&config);
        assert_eq!(state.end_reason(), None);

        let (state, first) = apply(&config, state, PositionEvent::end(EndReason::RouteFinished));
        let (state, second) = apply(&config, state, PositionEvent::end(EndReason::Operator));

        assert_eq!(first, second);
        assert_eq!(state.end_reason(), Some(EndReason::RouteFinished));
    }

    #[test]
    fn test_history_and_ticks_ignored_after_end() {
        let config = ViewerConfig::default();
        let state = live(&config);
        let (state, _) = apply(&config, state, PositionEvent::end(EndReason::Operator));
        let before = state.clone();

        let (state, c1) = apply(&config, state, PositionEvent::history(vec![RawPosition::new(1.0, 1.0, 0.0)]));
        let (state, c2) = apply(&config, state, PositionEvent::tick(Position::BOGOTA));
        let (state, c3) = apply(&config, state, PositionEvent::SourceFailed { reason: "offline".into() });

        assert!(c1.is_noop() && c2.is_noop() && c3.is_noop());
        assert_eq!(state, before);
    }

    #[test]
    fn test_events_before_ready_are_dropped() {
        let config = ViewerConfig::default();
        let state = config.new_state(SessionId::new("early").unwrap());
        let before = state.clone();

        for event in [
            PositionEvent::tick(Position::BOGOTA),
            PositionEvent::snapshot(Some(1.0), Some(2.0)),
            PositionEvent::history(vec![RawPosition::new(1.0, 2.0, 3.0)]),
            PositionEvent::ManualRecenter,
            PositionEvent::end(EndReason::Operator),
        ] {
            let (state, command) = apply(&config, before.clone(), event);
            assert_eq!(command, RenderCommand::status("not ready", now()));
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_history_replaces_and_skips_invalid_records() {
        let config = ViewerConfig::default();
        let state = live(&config);
        let (state, _) = apply(&config, state, PositionEvent::tick(Position::BOGOTA));
        let marker = state.current_position();

        let records = vec![
            RawPosition::new(4.70, -74.07, 1.0),
            RawPosition { lat: Some(4.71), lng: None, ts: Some(2.0) },
            RawPosition::new(95.0, -74.07, 3.0),
            RawPosition::new(4.72, -74.08, 4.0),
        ];
        let (state, command) = apply(&config, state, PositionEvent::history(records));

        let expected = vec![
            Position::new(4.70, -74.07).unwrap().with_ts(1.0),
            Position::new(4.72, -74.08).unwrap().with_ts(4.0),
        ];
        assert_eq!(command, RenderCommand::ReplacePath { positions: expected.clone() });
        assert_eq!(state.path().to_vec(), expected);
        // History does not move the marker
        assert_eq!(state.current_position(), marker);
    }

    #[test]
    fn test_manual_recenter_uses_current_marker() {
        let config = ViewerConfig::default().with_recenter(RecenterPolicy::free_roam());
        let state = live(&config);

        let (state, command) = apply(&config, state, PositionEvent::ManualRecenter);
        assert_eq!(command.status_message(), Some("waiting for location"));
        assert!(!state.manual_recenter());

        let p = Position::BOGOTA.offset(0.001, 0.0);
        let (state, _) = apply(&config, state, PositionEvent::tick(p));
        let (state, command) = apply(&config, state, PositionEvent::ManualRecenter);

        assert_eq!(command, RenderCommand::RecenterOn { position: p });
        assert!(state.manual_recenter());
        assert_eq!(state.view_center(), p);

        let (state, _) = apply(&config, state, PositionEvent::ClearManualRecenter);
        assert!(!state.manual_recenter());
    }

    #[test]
    fn test_follow_supersedes_manual_pan() {
        let config = ViewerConfig::default();
        let state = live(&config);

        let elsewhere = Position::new(6.2442, -75.5812).unwrap();
        let (state, command) = apply(&config, state, PositionEvent::ViewPanned { center: elsewhere });
        assert!(command.is_noop());
        assert!(state.manual_recenter());

        let p = Position::BOGOTA.offset(0.0005, 0.0005);
        let (state, command) = apply(&config, state, PositionEvent::tick(p));
        assert!(command.recenters());
        assert_eq!(state.view_center(), p);
        assert!(!state.manual_recenter());
    }

    #[test]
    fn test_follow_supersedes_manual_recenter() {
        let config = ViewerConfig::default();
        let state = live(&config);

        let (state, _) = apply(&config, state, PositionEvent::tick(Position::BOGOTA));
        let (state, command) = apply(&config, state, PositionEvent::ManualRecenter);
        assert_eq!(command, RenderCommand::RecenterOn { position: Position::BOGOTA });
        assert!(state.manual_recenter());
        assert_eq!(state.view_center(), Position::BOGOTA);

        let next = Position::new(5.011, -74.0721).unwrap();
        let (state, command) = apply(&config, state, PositionEvent::tick(next));
        assert_eq!(
            command,
            RenderCommand::MoveMarkerAndMaybeRecenter {
                position: next,
                should_recenter: true,
            }
        );
        assert!(!state.manual_recenter());
        assert_eq!(state.view_center(), next);
        assert_eq!(state.current_position(), Some(next));
    }

    #[test]
    fn test_free_roam_respects_pan_until_drift() {
        let config = ViewerConfig::default().with_recenter(RecenterPolicy::free_roam());
        let state = live(&config);

        // Operator pans ~1.1 km north of the subject
        let panned = Position::BOGOTA.offset(0.01, 0.0);
        let (state, _) = apply(&config, state, PositionEvent::ViewPanned { center: panned });

        let (state, command) = apply(&config, state, PositionEvent::tick(Position::BOGOTA));
        assert!(!command.recenters());
        assert_eq!(state.view_center(), panned);

        // Subject drifts ~3.3 km south of the view
        let far = Position::BOGOTA.offset(-0.02, 0.0);
        let (state, command) = apply(&config, state, PositionEvent::tick(far));
        assert!(command.recenters());
        assert_eq!(state.view_center(), far);
    }

    #[test]
    fn test_source_failure_surfaces_status_only() {
        let config = ViewerConfig::default();
        let state = live(&config);
        let before = state.clone();

        let (state, command) = apply(&config, state, PositionEvent::SourceFailed { reason: "permission-denied".into() });
        assert_eq!(command.status_message(), Some("source unavailable: permission-denied"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_open_session() {
        let config = ViewerConfig::default();

        match open_session(&config, &SessionLink::from_query("?id=abc"), now()) {
            SessionStart::Tracking(state) => {
                assert_eq!(state.session().as_str(), "abc");
                assert_eq!(state.phase(), Phase::Initializing);
            }
            other => panic!("expected tracking, got {:?}", other),
        }

        assert_eq!(
            open_session(&config, &SessionLink::from_query("?id="), now()),
            SessionStart::Rejected(RenderCommand::status("invalid link", now()))
        );
    }

    #[test]
    fn test_clocked_reducer() {
        let reducer = PositionStreamReducer::new(ViewerConfig::default(), TokioContext::shared());
        let state = match reducer.open(&SessionLink::from_query("id=clock")) {
            SessionStart::Tracking(state) => state,
            other => panic!("expected tracking, got {:?}", other),
        };
        assert!(reducer.is_stale(&state));

        let (state, _) = reducer.reduce(state, PositionEvent::ViewReady);
        let (state, _) = reducer.reduce(state, PositionEvent::tick(Position::BOGOTA));
        assert!(!reducer.is_stale(&state));
        assert_eq!(state.current_position(), Some(Position::BOGOTA));
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    fn valid_position() -> impl Strategy<Value = Position> {
        (-90.0..=90.0f64, -180.0..=180.0f64).prop_map(|(lat, lng)| Position { lat, lng, ts: None })
    }

    fn invalid_snapshot() -> impl Strategy<Value = PositionEvent> {
        prop_oneof![
            (-180.0..=180.0f64).prop_map(|lng| PositionEvent::snapshot(None, Some(lng))),
            (-90.0..=90.0f64).prop_map(|lat| PositionEvent::snapshot(Some(lat), None)),
            Just(PositionEvent::snapshot(None, None)),
            (90.000001..1e6f64, -180.0..=180.0f64)
                .prop_map(|(lat, lng)| PositionEvent::snapshot(Some(lat), Some(lng))),
            (-1e6..-90.000001f64, -180.0..=180.0f64)
                .prop_map(|(lat, lng)| PositionEvent::snapshot(Some(lat), Some(lng))),
            (-90.0..=90.0f64, 180.000001..1e6f64)
                .prop_map(|(lat, lng)| PositionEvent::snapshot(Some(lat), Some(lng))),
            (-90.0..=90.0f64, -1e6..-180.000001f64)
                .prop_map(|(lat, lng)| PositionEvent::tick(Position { lat, lng, ts: None })),
        ]
    }

    fn raw_record() -> impl Strategy<Value = RawPosition> {
        (
            proptest::option::weighted(0.9, -100.0..=100.0f64),
            proptest::option::weighted(0.9, -190.0..=190.0f64),
            proptest::option::of(0.0..1e9f64),
        )
            .prop_map(|(lat, lng, ts)| RawPosition { lat, lng, ts })
    }

    /// Meters per degree of latitude on the haversine sphere.
    const M_PER_DEG: f64 = 6_371_008.8 * std::f64::consts::PI / 180.0;

    proptest! {
        #[test]
        fn accepted_position_becomes_marker(
            mode in prop_oneof![Just(RecenterPolicy::Follow), Just(RecenterPolicy::free_roam())],
            warmup in proptest::collection::vec(valid_position(), 0..5),
            p in valid_position(),
        ) {
            let config = ViewerConfig::default().with_recenter(mode);
            let mut state = live(&config);
            for w in warmup {
                state = apply(&config, state, PositionEvent::tick(w)).0;
            }

            let (state, _) = apply(&config, state, PositionEvent::snapshot(Some(p.lat), Some(p.lng)));
            prop_assert_eq!(state.current_position(), Some(p));
            prop_assert_eq!(state.path().last(), Some(&p));
        }

        #[test]
        fn invalid_input_leaves_state_untouched(
            warmup in proptest::collection::vec(valid_position(), 0..5),
            event in invalid_snapshot(),
        ) {
            let config = ViewerConfig::default();
            let mut state = live(&config);
            for w in warmup {
                state = apply(&config, state, PositionEvent::tick(w)).0;
            }
            let before = state.clone();

            let (state, command) = apply(&config, state, event.clone());
            prop_assert_eq!(command.status_message(), Some("waiting for location"));
            prop_assert_eq!(&state, &before);

            // Rejecting again changes nothing either
            let (state, _) = apply(&config, state, event);
            prop_assert_eq!(&state, &before);
        }

        #[test]
        fn history_replay_is_idempotent(records in proptest::collection::vec(raw_record(), 0..700)) {
            let config = ViewerConfig::default();
            let state = live(&config);

            let (once, c1) = apply(&config, state, PositionEvent::history(records.clone()));
            let (twice, c2) = apply(&config, once.clone(), PositionEvent::history(records));

            prop_assert_eq!(once.path(), twice.path());
            prop_assert_eq!(c1, c2);
            prop_assert!(twice.path().len() <= 500);
        }

        #[test]
        fn follow_mode_always_recenters(points in proptest::collection::vec(valid_position(), 1..30)) {
            let config = ViewerConfig::default().with_recenter(RecenterPolicy::Follow);
            let mut state = live(&config);
            for p in points {
                let (next, command) = apply(&config, state, PositionEvent::tick(p));
                prop_assert!(
                    matches!(
                        command,
                        RenderCommand::MoveMarkerAndMaybeRecenter { should_recenter: true, .. }
                    ),
                    "unexpected command"
                );
                state = next;
            }
        }

        #[test]
        fn free_roam_gates_on_distance(
            lat in -80.0..80.0f64,
            lng in -180.0..=180.0f64,
            meters in prop_oneof![0.0..1990.0f64, 2010.0..50_000.0f64],
            north in any::<bool>(),
        ) {
            let config = ViewerConfig::default().with_recenter(RecenterPolicy::free_roam());
            let state = live(&config);
            let center = Position { lat, lng, ts: None };
            let (state, _) = apply(&config, state, PositionEvent::ViewPanned { center });

            let dlat = meters / M_PER_DEG * if north { 1.0 } else { -1.0 };
            let p = center.offset(dlat, 0.0);
            let (_, command) = apply(&config, state, PositionEvent::tick(p));

            let expected = meters > 2000.0;
            prop_assert_eq!(
                command,
                RenderCommand::MoveMarkerAndMaybeRecenter { position: p, should_recenter: expected }
            );
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn path_keeps_last_500_in_arrival_order(extra in 1usize..700) {
            let config = ViewerConfig::default();
            let mut state = live(&config);
            let accepted: Vec<Position> = (0..500 + extra)
                .map(|i| Position::BOGOTA.offset((i % 1000) as f64 * 1e-6, (i / 1000) as f64 * 1e-6))
                .collect();

            for p in &accepted {
                state = apply(&config, state, PositionEvent::tick(*p)).0;
            }

            prop_assert_eq!(state.path().len(), 500);
            prop_assert_eq!(state.path().to_vec(), accepted[accepted.len() - 500..].to_vec());
        }
    }
}
