//! Viewer scenarios for deterministic runs.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIM-001: Seeded random walk at 1.2s cadence, then session end
    SimulatedWalk,

    /// SIM-002: Remote snapshots and growing history in follow mode
    RemoteFollow,

    /// SIM-003: Snapshots with missing and out-of-range coordinates
    PartialData,

    /// SIM-004: Remote data keeps arriving after the session ended
    LateAfterEnd,

    /// SIM-005: Events delivered before the map is ready
    EarlyEvents,

    /// SIM-006: Free-roam with an operator pan and a long-stride walk
    FreeRoamDrift,

    /// SIM-007: History delivery larger than the path cap, replayed
    HistoryOverflow,

    /// SIM-008: Subscription errors between snapshots
    SourceOutage,

    /// SIM-009: Share link without a session id
    InvalidLink,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::SimulatedWalk,
            ScenarioId::RemoteFollow,
            ScenarioId::PartialData,
            ScenarioId::LateAfterEnd,
            ScenarioId::EarlyEvents,
            ScenarioId::FreeRoamDrift,
            ScenarioId::HistoryOverflow,
            ScenarioId::SourceOutage,
            ScenarioId::InvalidLink,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::SimulatedWalk => "simulated_walk",
            ScenarioId::RemoteFollow => "remote_follow",
            ScenarioId::PartialData => "partial_data",
            ScenarioId::LateAfterEnd => "late_after_end",
            ScenarioId::EarlyEvents => "early_events",
            ScenarioId::FreeRoamDrift => "free_roam_drift",
            ScenarioId::HistoryOverflow => "history_overflow",
            ScenarioId::SourceOutage => "source_outage",
            ScenarioId::InvalidLink => "invalid_link",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::SimulatedWalk => "40-step jittered walk from Bogotá, path and marker track every tick",
            ScenarioId::RemoteFollow => "Snapshot + full-history deliveries, view follows every position",
            ScenarioId::PartialData => "Partial and out-of-range snapshots are rejected, never read as (0,0)",
            ScenarioId::LateAfterEnd => "After session end, late snapshots and history change nothing",
            ScenarioId::EarlyEvents => "Events before view setup are dropped with a not-ready status",
            ScenarioId::FreeRoamDrift => "View stays put until the subject drifts past the threshold",
            ScenarioId::HistoryOverflow => "800-record history keeps the newest 500, replay is idempotent",
            ScenarioId::SourceOutage => "Subscription errors surface as status lines, state survives",
            ScenarioId::InvalidLink => "Link without `id` shows an invalid-link status and attaches nothing",
        }
    }

    /// Returns true if the scenario needs a session-less link.
    pub fn overrides_link(&self) -> bool {
        matches!(self, ScenarioId::InvalidLink)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simulated_walk" | "walk" | "sim-001" => Ok(ScenarioId::SimulatedWalk),
            "remote_follow" | "follow" | "sim-002" => Ok(ScenarioId::RemoteFollow),
            "partial_data" | "partial" | "sim-003" => Ok(ScenarioId::PartialData),
            "late_after_end" | "late" | "sim-004" => Ok(ScenarioId::LateAfterEnd),
            "early_events" | "early" | "sim-005" => Ok(ScenarioId::EarlyEvents),
            "free_roam_drift" | "drift" | "sim-006" => Ok(ScenarioId::FreeRoamDrift),
            "history_overflow" | "overflow" | "sim-007" => Ok(ScenarioId::HistoryOverflow),
            "source_outage" | "outage" | "sim-008" => Ok(ScenarioId::SourceOutage),
            "invalid_link" | "sim-009" => Ok(ScenarioId::InvalidLink),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>(), Ok(id));
        }
        assert_eq!("SIM-004".parse::<ScenarioId>(), Ok(ScenarioId::LateAfterEnd));
        assert!("chaos".parse::<ScenarioId>().is_err());
    }
}
