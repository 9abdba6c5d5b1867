//! Scenario runner - drives the viewer through each scenario and checks it.

use crate::driver::{DriverReport, DriverStats, ViewerDriver};
use crate::scenarios::ScenarioId;
use crate::sink::{LogSink, RecordedStep, RecordingSink, Tee};
use crate::sources::{ScriptedSource, TickSource, DEFAULT_TICK_INTERVAL};
use crate::walk::{Route, RouteGenerator, DEFAULT_DELTA_DEG, DEFAULT_STEPS};
use crate::context::SimContext;

use mura_core::{
    status, EndReason, Position, PositionEvent, PositionStreamReducer, RawPosition, RecenterPolicy,
    RenderCommand, SessionStart, ViewerConfig,
};
use mura_env::{EnvError, SessionLink, ViewerContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Largest history delivery the overflow scenario builds.
pub const MAX_HISTORY_RECORDS: usize = 10_000;

/// Simulation parameters for one run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Points per simulated route
    pub steps: usize,

    /// Per-axis jitter in degrees
    pub delta_deg: f64,

    /// Tick cadence
    pub interval: Duration,

    /// Share-link query string (`None` = `?id=sim-<seed>`)
    pub link: Option<String>,

    /// Log each render command as it is applied
    pub log_commands: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: DEFAULT_STEPS,
            delta_deg: DEFAULT_DELTA_DEG,
            interval: DEFAULT_TICK_INTERVAL,
            link: None,
            log_commands: false,
        }
    }
}

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Session id, if the link named one
    pub session: Option<String>,

    /// Recenter mode the session ran under
    pub mode: RecenterPolicy,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Counters from the driver
    pub stats: DriverStats,

    /// Context clock at the end of the run
    pub elapsed_secs: f64,

    /// Path when the run finished
    pub final_path: Vec<Position>,

    /// Every reducer step, in order
    pub steps: Vec<RecordedStep>,
}

/// Accumulates failed expectations.
#[derive(Default)]
struct Checks(Vec<String>);

impl Checks {
    fn check(&mut self, ok: bool, what: impl FnOnce() -> String) {
        if !ok {
            self.0.push(what());
        }
    }

    fn verdict(self) -> (bool, Option<String>) {
        if self.0.is_empty() {
            (true, None)
        } else {
            (false, Some(self.0.join("; ")))
        }
    }
}

/// What a scenario body hands back to `run_with`.
struct Outcome {
    report: Option<DriverReport>,
    steps: Vec<RecordedStep>,
    checks: Checks,
}

/// Runs viewer scenarios.
pub struct ScenarioRunner {
    sim: SimConfig,
    viewer: ViewerConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(sim: SimConfig) -> Self {
        Self {
            sim,
            viewer: ViewerConfig::default(),
        }
    }

    /// Sets the viewer configuration (recenter mode, path cap, origin).
    pub fn with_viewer_config(mut self, viewer: ViewerConfig) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn seed(&self) -> u64 {
        self.sim.seed
    }

    /// Runs a scenario on a virtual clock.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_with(SimContext::shared(self.sim.seed), scenario).await
    }

    /// Runs a scenario on the given clock.
    pub async fn run_with<Ctx: ViewerContext>(&self, ctx: Arc<Ctx>, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.sim.seed);
        debug!("{}", scenario.description());

        let config = self.config_for(scenario);
        let mode = config.recenter;
        let reducer = PositionStreamReducer::new(config, ctx.clone());

        let link = if scenario.overrides_link() {
            SessionLink::from_query("?id=")
        } else {
            let query = self
                .sim
                .link
                .clone()
                .unwrap_or_else(|| format!("?id=sim-{}", self.sim.seed));
            SessionLink::from_query(&query)
        };
        let session = link.session().map(|s| s.to_string());

        let start = reducer.open(&link);
        let outcome = match start {
            SessionStart::Rejected(command) => self.check_rejected_link(scenario, command),
            SessionStart::Tracking(state) => {
                let driver = ViewerDriver::new(reducer, state);
                match scenario {
                    ScenarioId::SimulatedWalk => self.run_simulated_walk(ctx.clone(), driver).await,
                    ScenarioId::RemoteFollow => self.run_remote_follow(driver).await,
                    ScenarioId::PartialData => self.run_partial_data(driver).await,
                    ScenarioId::LateAfterEnd => self.run_late_after_end(driver).await,
                    ScenarioId::EarlyEvents => self.run_early_events(driver).await,
                    ScenarioId::FreeRoamDrift => self.run_free_roam_drift(driver).await,
                    ScenarioId::HistoryOverflow => self.run_history_overflow(driver).await,
                    ScenarioId::SourceOutage => self.run_source_outage(driver).await,
                    ScenarioId::InvalidLink => {
                        let mut checks = Checks::default();
                        checks.check(false, || "link with empty id was accepted".to_string());
                        Outcome { report: None, steps: Vec::new(), checks }
                    }
                }
            }
        };

        let (passed, failure_reason) = outcome.checks.verdict();
        let (stats, final_path) = match &outcome.report {
            Some(report) => (report.stats.clone(), report.state.path().to_vec()),
            None => (DriverStats::default(), Vec::new()),
        };

        ScenarioResult {
            scenario,
            seed: self.sim.seed,
            session,
            mode,
            passed,
            failure_reason,
            stats,
            elapsed_secs: ctx.now().as_secs_f64(),
            final_path,
            steps: outcome.steps,
        }
    }

    fn config_for(&self, scenario: ScenarioId) -> ViewerConfig {
        match scenario {
            ScenarioId::RemoteFollow => self.viewer.clone().with_recenter(RecenterPolicy::Follow),
            ScenarioId::FreeRoamDrift => match self.viewer.recenter {
                RecenterPolicy::FreeRoam { .. } => self.viewer.clone(),
                RecenterPolicy::Follow => self.viewer.clone().with_recenter(RecenterPolicy::free_roam()),
            },
            _ => self.viewer.clone(),
        }
    }

    /// Route generator seeded apart from the context seed.
    fn routes(&self) -> RouteGenerator {
        RouteGenerator::new(self.sim.seed.wrapping_mul(0x9e3779b97f4a7c15))
    }

    async fn drive<Ctx: ViewerContext>(&self, driver: ViewerDriver<Ctx>) -> (DriverReport, Vec<RecordedStep>) {
        if self.sim.log_commands {
            let mut sink = Tee(RecordingSink::new(), LogSink);
            let report = driver.run(&mut sink).await;
            (report, sink.0.into_steps())
        } else {
            let mut sink = RecordingSink::new();
            let report = driver.run(&mut sink).await;
            (report, sink.into_steps())
        }
    }

    /// SIM-001: SimulatedWalk - the demo mode of the viewer.
    ///
    /// **Assertion**: every tick accepted, path == route (within the cap),
    /// marker == last point, exactly one session-end status.
    async fn run_simulated_walk<Ctx: ViewerContext>(
        &self,
        ctx: Arc<Ctx>,
        mut driver: ViewerDriver<Ctx>,
    ) -> Outcome {
        let origin = self.viewer.origin;
        let route = self.routes().make_route(origin, self.sim.steps, self.sim.delta_deg);
        let cap = self.viewer.max_path_len.max(1);
        let expected: Vec<Position> = route.points()[route.len().saturating_sub(cap)..].to_vec();
        let last = route.last();

        driver.attach(TickSource::new(ctx, route.clone(), self.sim.interval));
        let (report, steps) = self.drive(driver.ready_on_start()).await;

        let mut checks = Checks::default();
        checks.check(report.stats.accepted == route.len() as u64, || {
            format!("accepted {} of {} ticks", report.stats.accepted, route.len())
        });
        checks.check(report.state.path().to_vec() == expected, || {
            "path does not match simulated route".to_string()
        });
        checks.check(report.state.current_position() == last, || {
            "marker is not on the last route point".to_string()
        });
        checks.check(report.state.is_ended(), || "session did not end".to_string());
        checks.check(report.state.end_reason() == Some(EndReason::RouteFinished), || {
            format!("session ended with {:?}", report.state.end_reason())
        });

        let ended = steps
            .iter()
            .filter(|s| s.command.status_message() == Some(status::SESSION_ENDED))
            .count();
        checks.check(ended == 1, || format!("{} session-end statuses", ended));

        Outcome { report: Some(report), steps, checks }
    }

    /// SIM-002: RemoteFollow - the live listener mode.
    ///
    /// Each snapshot is followed by a full history delivery that includes it.
    /// **Assertion**: every accepted position recenters, final path == route.
    async fn run_remote_follow<Ctx: ViewerContext>(&self, mut driver: ViewerDriver<Ctx>) -> Outcome {
        let route = self
            .routes()
            .make_route(self.viewer.origin, self.sim.steps, self.sim.delta_deg);
        let records: Vec<RawPosition> = route
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| RawPosition::new(p.lat, p.lng, i as f64))
            .collect();

        let mut script = ScriptedSource::new("remote");
        for (i, p) in route.points().iter().enumerate() {
            script = script
                .push(PositionEvent::snapshot(Some(p.lat), Some(p.lng)))
                .push(PositionEvent::history(records[..=i].to_vec()));
        }

        driver.attach(script);
        let (report, steps) = self.drive(driver.ready_on_start()).await;

        let mut checks = Checks::default();
        let lagging = steps
            .iter()
            .filter(|s| {
                matches!(
                    s.command,
                    RenderCommand::MoveMarkerAndMaybeRecenter { should_recenter: false, .. }
                )
            })
            .count();
        checks.check(lagging == 0, || format!("{} positions did not recenter", lagging));

        let cap = self.viewer.max_path_len.max(1);
        let expected = &route.points()[route.len().saturating_sub(cap)..];
        let coords_match = report.state.path().len() == expected.len()
            && report
                .state
                .path()
                .iter()
                .zip(expected)
                .all(|(a, b)| a.lat == b.lat && a.lng == b.lng);
        checks.check(coords_match, || "path does not match remote history".to_string());
        checks.check(report.state.current_position() == route.last(), || {
            "marker is not on the last snapshot".to_string()
        });

        Outcome { report: Some(report), steps, checks }
    }

    /// SIM-003: PartialData - untrusted snapshots.
    ///
    /// **Assertion**: every bad report rejected, no marker ever outside the route.
    async fn run_partial_data<Ctx: ViewerContext>(&self, mut driver: ViewerDriver<Ctx>) -> Outcome {
        let route = self
            .routes()
            .make_route(self.viewer.origin, self.sim.steps, self.sim.delta_deg);

        let mut script = ScriptedSource::new("session-doc");
        let mut injected = 0u64;
        for (i, p) in route.points().iter().enumerate() {
            let bad = match i % 4 {
                0 => PositionEvent::snapshot(Some(p.lat), None),
                1 => PositionEvent::snapshot(None, Some(p.lng)),
                2 => PositionEvent::snapshot(Some(p.lat + 180.0), Some(p.lng)),
                _ => PositionEvent::snapshot(None, None),
            };
            injected += 1;
            script = script
                .push(bad)
                .push(PositionEvent::snapshot(Some(p.lat), Some(p.lng)));
        }

        driver.attach(script);
        let (report, steps) = self.drive(driver.ready_on_start()).await;

        let mut checks = Checks::default();
        checks.check(report.stats.rejected == injected, || {
            format!("rejected {} of {} bad reports", report.stats.rejected, injected)
        });
        checks.check(report.stats.accepted == route.len() as u64, || {
            format!("accepted {} of {} good reports", report.stats.accepted, route.len())
        });
        let stray = steps
            .iter()
            .filter_map(|s| s.marker)
            .filter(|m| !route.points().contains(m))
            .count();
        checks.check(stray == 0, || format!("{} markers off the route", stray));

        Outcome { report: Some(report), steps, checks }
    }

    /// SIM-004: LateAfterEnd - the listener is never torn down.
    ///
    /// **Assertion**: after `SessionEnd` nothing moves, repeated end is identical.
    async fn run_late_after_end<Ctx: ViewerContext>(&self, mut driver: ViewerDriver<Ctx>) -> Outcome {
        let mut routes = self.routes();
        let before = routes.make_route(self.viewer.origin, self.sim.steps, self.sim.delta_deg);
        let after = routes.make_route(self.viewer.origin, self.sim.steps, self.sim.delta_deg);

        let late: Vec<PositionEvent> = after
            .points()
            .iter()
            .map(|p| PositionEvent::snapshot(Some(p.lat), Some(p.lng)))
            .collect();
        let late_history = after.points().iter().map(|p| RawPosition::from(*p)).collect();

        let script = ScriptedSource::new("remote")
            .extend(before.points().iter().map(|p| PositionEvent::tick(*p)))
            .push(PositionEvent::end(EndReason::Operator))
            .extend(late)
            .push(PositionEvent::history(late_history))
            .push(PositionEvent::end(EndReason::Operator));

        driver.attach(script);
        let (report, steps) = self.drive(driver.ready_on_start()).await;

        let mut checks = Checks::default();
        let end_idx = steps.iter().position(|s| s.ended);
        match end_idx {
            None => checks.check(false, || "session never ended".to_string()),
            Some(idx) => {
                let at_end = &steps[idx];
                let tail = &steps[idx + 1..];
                let moved = tail
                    .iter()
                    .filter(|s| s.marker != at_end.marker || s.path_len != at_end.path_len)
                    .count();
                checks.check(moved == 0, || format!("{} late events changed the view", moved));

                let non_noop = tail
                    .iter()
                    .filter(|s| s.event != "session_end" && !s.command.is_noop())
                    .count();
                checks.check(non_noop == 0, || format!("{} late events rendered", non_noop));

                let repeated_end_matches = tail
                    .iter()
                    .filter(|s| s.event == "session_end")
                    .all(|s| s.command == at_end.command);
                checks.check(repeated_end_matches, || {
                    "repeated session end changed the status".to_string()
                });
            }
        }
        checks.check(report.state.current_position() == before.last(), || {
            "marker moved after the session ended".to_string()
        });
        checks.check(report.state.status() == status::SESSION_ENDED, || {
            format!("status is {:?}", report.state.status())
        });

        Outcome { report: Some(report), steps, checks }
    }

    /// SIM-005: EarlyEvents - nothing is buffered before the view is ready.
    async fn run_early_events<Ctx: ViewerContext>(&self, mut driver: ViewerDriver<Ctx>) -> Outcome {
        let origin = self.viewer.origin;
        let first = origin.offset(0.0001, 0.0001);
        let script = ScriptedSource::new("remote")
            .push(PositionEvent::snapshot(Some(origin.lat), Some(origin.lng)))
            .push(PositionEvent::tick(origin))
            .push(PositionEvent::history(vec![RawPosition::from(origin)]))
            .push(PositionEvent::ViewReady)
            .push(PositionEvent::snapshot(Some(first.lat), Some(first.lng)));

        driver.attach(script);
        let (report, steps) = self.drive(driver).await;

        let mut checks = Checks::default();
        checks.check(report.stats.not_ready == 3, || {
            format!("{} events reported not ready", report.stats.not_ready)
        });
        checks.check(report.state.path().to_vec() == vec![first], || {
            "early events leaked into the path".to_string()
        });
        checks.check(report.state.is_live(), || "session is not live".to_string());

        Outcome { report: Some(report), steps, checks }
    }

    /// SIM-006: FreeRoamDrift - the operator keeps control of the view.
    ///
    /// **Assertion**: a kept view is within the threshold of the new position;
    /// a moved view lands on it.
    async fn run_free_roam_drift<Ctx: ViewerContext>(&self, mut driver: ViewerDriver<Ctx>) -> Outcome {
        let origin = self.viewer.origin;
        // Strides of up to ~1 km per axis so the threshold is crossed
        let route = self.routes().make_route(origin, self.sim.steps, 0.02);
        let threshold = match self.config_for(ScenarioId::FreeRoamDrift).recenter {
            RecenterPolicy::FreeRoam { threshold_m } => threshold_m,
            RecenterPolicy::Follow => 0.0,
        };

        let script = ScriptedSource::new("operator+walk")
            .push(PositionEvent::ViewPanned {
                center: origin.offset(0.005, -0.005),
            })
            .extend(route.points().iter().map(|p| PositionEvent::tick(*p)));

        driver.attach(script);
        let (report, steps) = self.drive(driver.ready_on_start()).await;

        let mut checks = Checks::default();
        for s in &steps {
            if let RenderCommand::MoveMarkerAndMaybeRecenter { position, should_recenter } = &s.command {
                if *should_recenter {
                    checks.check(s.view_center == *position, || {
                        "recentered view is not on the marker".to_string()
                    });
                } else {
                    let d = s.view_center.distance_m(position);
                    checks.check(d <= threshold, || {
                        format!("view kept {:.0} m away (threshold {:.0} m)", d, threshold)
                    });
                }
            }
        }
        checks.check(report.stats.accepted == route.len() as u64, || {
            format!("accepted {} of {} ticks", report.stats.accepted, route.len())
        });

        Outcome { report: Some(report), steps, checks }
    }

    /// SIM-007: HistoryOverflow - oversized deliveries and replays.
    async fn run_history_overflow<Ctx: ViewerContext>(&self, mut driver: ViewerDriver<Ctx>) -> Outcome {
        let cap = self.viewer.max_path_len.max(1);
        let total = cap.saturating_add(300).min(MAX_HISTORY_RECORDS);
        let route: Route = self
            .routes()
            .make_route(self.viewer.origin, total, self.sim.delta_deg);
        let records: Vec<RawPosition> = route
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| RawPosition::new(p.lat, p.lng, i as f64))
            .collect();

        let script = ScriptedSource::new("positions-query")
            .push(PositionEvent::history(records.clone()))
            .push(PositionEvent::history(records));

        driver.attach(script);
        let (report, steps) = self.drive(driver.ready_on_start()).await;

        let mut checks = Checks::default();
        let replacements: Vec<&RenderCommand> = steps
            .iter()
            .map(|s| &s.command)
            .filter(|c| matches!(c, RenderCommand::ReplacePath { .. }))
            .collect();
        checks.check(replacements.len() == 2, || {
            format!("{} path replacements", replacements.len())
        });
        checks.check(replacements.windows(2).all(|w| w[0] == w[1]), || {
            "history replay produced a different path".to_string()
        });
        let expected_len = cap.min(total);
        checks.check(report.state.path().len() == expected_len, || {
            format!("path holds {} points, expected {}", report.state.path().len(), expected_len)
        });
        let newest_kept = report
            .state
            .path()
            .last()
            .map(|p| p.ts == Some((route.len() - 1) as f64))
            .unwrap_or(false);
        checks.check(newest_kept, || "newest record was not kept".to_string());

        Outcome { report: Some(report), steps, checks }
    }

    /// SIM-008: SourceOutage - errors are reported, never fatal.
    async fn run_source_outage<Ctx: ViewerContext>(&self, mut driver: ViewerDriver<Ctx>) -> Outcome {
        let route = self.routes().make_route(self.viewer.origin, 3, self.sim.delta_deg);
        let p = route.points();

        let script = ScriptedSource::new("session-doc")
            .push(PositionEvent::snapshot(Some(p[0].lat), Some(p[0].lng)))
            .fail(EnvError::unavailable("the client is offline"))
            .push(PositionEvent::snapshot(Some(p[1].lat), Some(p[1].lng)))
            .fail(EnvError::unavailable("deadline exceeded"))
            .fail(EnvError::Timeout(10_000))
            .push(PositionEvent::snapshot(Some(p[2].lat), Some(p[2].lng)));

        driver.attach(script);
        let (report, steps) = self.drive(driver.ready_on_start()).await;

        let mut checks = Checks::default();
        checks.check(report.stats.source_errors == 3, || {
            format!("{} source errors surfaced", report.stats.source_errors)
        });
        checks.check(report.state.current_position() == Some(p[2]), || {
            "marker lost across outages".to_string()
        });
        checks.check(report.state.path().len() == 3, || {
            format!("path holds {} points", report.state.path().len())
        });

        Outcome { report: Some(report), steps, checks }
    }

    /// SIM-009: InvalidLink - no session, no stream.
    fn check_rejected_link(&self, scenario: ScenarioId, command: RenderCommand) -> Outcome {
        let mut checks = Checks::default();
        checks.check(scenario == ScenarioId::InvalidLink, || {
            "share link was rejected".to_string()
        });
        checks.check(command.status_message() == Some(status::INVALID_LINK), || {
            format!("unexpected rejection: {:?}", command)
        });
        Outcome {
            report: None,
            steps: Vec::new(),
            checks,
        }
    }
}
