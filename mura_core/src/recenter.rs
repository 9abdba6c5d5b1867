//! Recenter policies.
//!
//! The viewer evolved between two behaviours without settling on one, so
//! both are kept and chosen when the session starts:
//! - **Follow**: the view chases every accepted position.
//! - **Free-roam**: the view stays where the operator left it unless the
//!   subject drifts further than a threshold from the view center.

use crate::position::Position;
use serde::{Deserialize, Serialize};

/// Reference free-roam threshold in meters.
pub const DEFAULT_RECENTER_THRESHOLD_M: f64 = 2000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RecenterPolicy {
    /// Recenter on every accepted position.
    #[default]
    Follow,

    /// Recenter only when the new position is more than `threshold_m`
    /// meters from the current view center.
    FreeRoam { threshold_m: f64 },
}

impl RecenterPolicy {
    /// Free-roam with the reference threshold.
    pub fn free_roam() -> Self {
        RecenterPolicy::FreeRoam {
            threshold_m: DEFAULT_RECENTER_THRESHOLD_M,
        }
    }

    /// Decides whether the view should move to `next`.
    pub fn should_recenter(&self, view_center: &Position, next: &Position) -> bool {
        match self {
            RecenterPolicy::Follow => true,
            RecenterPolicy::FreeRoam { threshold_m } => {
                view_center.distance_m(next) > *threshold_m
            }
        }
    }

    pub fn is_follow(&self) -> bool {
        matches!(self, RecenterPolicy::Follow)
    }

    /// Returns the mode name.
    pub fn name(&self) -> &'static str {
        match self {
            RecenterPolicy::Follow => "follow",
            RecenterPolicy::FreeRoam { .. } => "free-roam",
        }
    }
}

impl std::fmt::Display for RecenterPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecenterPolicy::Follow => write!(f, "follow"),
            RecenterPolicy::FreeRoam { threshold_m } => write!(f, "free-roam ({threshold_m} m)"),
        }
    }
}

impl std::str::FromStr for RecenterPolicy {
    type Err = String;

    /// Parses a mode name. Free-roam gets the reference threshold.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "follow" => Ok(RecenterPolicy::Follow),
            "free-roam" | "free_roam" | "freeroam" => Ok(RecenterPolicy::free_roam()),
            _ => Err(format!("Unknown recenter mode: {}", s)),
        }
    }
}
