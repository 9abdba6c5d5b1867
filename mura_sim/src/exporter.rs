//! JSON exporter for scenario runs.
//!
//! Writes the ordered render-command log of one run, with enough context
//! (seed, session, recenter mode) to replay it.

use crate::driver::DriverStats;
use crate::error::SimError;
use crate::runner::ScenarioResult;
use crate::sink::RecordedStep;

use mura_core::Position;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Complete export of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Session id, absent for rejected links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,

    /// Recenter mode (`follow` or `free-roam`)
    pub mode: String,

    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    pub stats: DriverStats,

    /// Context clock at the end of the run
    pub duration_sec: f64,

    pub final_path: Vec<Position>,

    /// Every reducer step in delivery order
    pub steps: Vec<RecordedStep>,
}

impl ViewerExport {
    /// Builds the export for a finished run.
    pub fn from_result(result: &ScenarioResult) -> Self {
        Self {
            scenario: result.scenario.name().to_string(),
            seed: result.seed,
            session: result.session.clone(),
            mode: result.mode.name().to_string(),
            passed: result.passed,
            failure_reason: result.failure_reason.clone(),
            stats: result.stats.clone(),
            duration_sec: result.elapsed_secs,
            final_path: result.final_path.clone(),
            steps: result.steps.clone(),
        }
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), SimError> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{ScenarioRunner, SimConfig};
    use crate::scenarios::ScenarioId;

    #[tokio::test]
    async fn test_export_carries_command_log() {
        let runner = ScenarioRunner::new(SimConfig {
            steps: 3,
            ..Default::default()
        });
        let result = runner.run(ScenarioId::SimulatedWalk).await;
        let export = ViewerExport::from_result(&result);

        assert_eq!(export.scenario, "simulated_walk");
        assert_eq!(export.mode, "follow");
        assert_eq!(export.session.as_deref(), Some("sim-42"));
        // ready + 3 ticks + end
        assert_eq!(export.steps.len(), 5);

        let json = export.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["steps"][1]["command"]["command"], "move_marker_and_maybe_recenter");
        assert_eq!(value["steps"][4]["command"]["message"], "session ended");

        let back: ViewerExport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.steps, export.steps);
    }

    #[tokio::test]
    async fn test_rejected_link_export_has_no_session() {
        let runner = ScenarioRunner::new(SimConfig::default());
        let result = runner.run(ScenarioId::InvalidLink).await;
        let json = ViewerExport::from_result(&result).to_json().unwrap();

        assert!(result.passed);
        assert!(!json.contains("\"session\""));
    }
}
