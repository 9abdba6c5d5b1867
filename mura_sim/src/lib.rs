//! MÜRA deterministic simulation harness.
//!
//! Runs the live position viewer end to end without a map or a network:
//! upstream listeners are replaced by scripted sources and the simulated
//! walk, and wall-clock time by a virtual clock.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     ScenarioRunner                       │
//! │                                                          │
//! │  RouteGenerator ──► TickSource ──┐                       │
//! │                                  ├──► ViewerDriver       │
//! │  ScriptedSource ─────────────────┘        │              │
//! │                                  PositionStreamReducer   │
//! │                                           │              │
//! │                               RecordingSink / LogSink    │
//! │                                           │              │
//! │                                   checks + ViewerExport  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use mura_sim::{ScenarioRunner, SimConfig};
//! use mura_sim::scenarios::ScenarioId;
//!
//! let runner = ScenarioRunner::new(SimConfig { seed: 42, ..Default::default() });
//! let result = runner.run(ScenarioId::SimulatedWalk).await;
//! assert!(result.passed);
//! ```

mod context;
mod driver;
mod error;
mod exporter;
mod runner;
mod sink;
mod sources;
mod walk;
pub mod scenarios;

pub use context::SimContext;
pub use driver::{DriverReport, DriverStats, ViewerDriver, DEFAULT_CHANNEL_CAPACITY};
pub use error::SimError;
pub use exporter::ViewerExport;
pub use runner::{ScenarioResult, ScenarioRunner, SimConfig, MAX_HISTORY_RECORDS};
pub use sink::{Applied, LogSink, RecordedStep, RecordingSink, RenderSink, Tee};
pub use sources::{ScriptedSource, TickSource, DEFAULT_TICK_INTERVAL};
pub use walk::{Route, RouteGenerator, DEFAULT_DELTA_DEG, DEFAULT_STEPS};
