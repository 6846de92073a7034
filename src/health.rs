//! Weighted health aggregation and status classification.
//!
//! The per-subsystem breakdown is the single source for both the overall
//! score and the subsystem telemetry, so the two can never disagree.

use crate::state::ControllerState;
use crate::subsystems::{Subsystem, SubsystemId, SUBSYSTEM_COUNT};
use serde::{Deserialize, Serialize};

const OPERATIONAL_THRESHOLD: f64 = 90.0;
const WARNING_THRESHOLD: f64 = 70.0;
const DEGRADED_THRESHOLD: f64 = 40.0;
const CRITICAL_THRESHOLD: f64 = 10.0;

/// Discrete health class, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Operational,
    Warning,
    Degraded,
    Critical,
    Offline,
}

impl HealthStatus {
    pub fn color(self) -> &'static str {
        color_for(self)
    }

    pub fn from_color(color: &str) -> Option<Self> {
        [
            HealthStatus::Operational,
            HealthStatus::Warning,
            HealthStatus::Degraded,
            HealthStatus::Critical,
            HealthStatus::Offline,
        ]
        .into_iter()
        .find(|status| status.color().eq_ignore_ascii_case(color))
    }
}

impl core::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            HealthStatus::Operational => "OPERATIONAL",
            HealthStatus::Warning => "WARNING",
            HealthStatus::Degraded => "DEGRADED",
            HealthStatus::Critical => "CRITICAL",
            HealthStatus::Offline => "OFFLINE",
        };
        f.write_str(label)
    }
}

/// Thresholds are inclusive lower bounds, checked from the top.
pub fn classify(health: f64) -> HealthStatus {
    if health >= OPERATIONAL_THRESHOLD {
        HealthStatus::Operational
    } else if health >= WARNING_THRESHOLD {
        HealthStatus::Warning
    } else if health >= DEGRADED_THRESHOLD {
        HealthStatus::Degraded
    } else if health >= CRITICAL_THRESHOLD {
        HealthStatus::Critical
    } else {
        HealthStatus::Offline
    }
}

pub fn color_for(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Operational => "#00FF00",
        HealthStatus::Warning => "#FFFF00",
        HealthStatus::Degraded => "#FFA500",
        HealthStatus::Critical => "#FF0000",
        HealthStatus::Offline => "#808080",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubsystemHealth {
    pub id: SubsystemId,
    pub value: f64,
}

impl SubsystemHealth {
    pub fn weight(&self) -> f64 {
        self.id.weight()
    }

    pub fn status(&self) -> HealthStatus {
        classify(self.value)
    }
}

/// Per-contributor health values, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthBreakdown {
    entries: [SubsystemHealth; SUBSYSTEM_COUNT],
}

impl HealthBreakdown {
    pub fn entries(&self) -> &[SubsystemHealth; SUBSYSTEM_COUNT] {
        &self.entries
    }

    pub fn get(&self, id: SubsystemId) -> f64 {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map_or(0.0, |entry| entry.value)
    }

    /// `Σ(value·weight) / Σ(weight)`, clamped to `[0, 100]`.
    pub fn weighted_average(&self) -> f64 {
        let (weighted, total_weight) = self
            .entries
            .iter()
            .fold((0.0, 0.0), |(sum, weights), entry| {
                (sum + entry.value * entry.weight(), weights + entry.weight())
            });

        if total_weight <= 0.0 {
            return 0.0;
        }
        (weighted / total_weight).clamp(0.0, 100.0)
    }
}

pub struct HealthAggregator;

impl HealthAggregator {
    pub fn subsystem_value(state: &ControllerState, id: SubsystemId) -> f64 {
        match id {
            SubsystemId::ApcuController => state.controller().health_score(),
            SubsystemId::TemperatureMonitoring => state.thermal().health_score(),
            SubsystemId::BoardData => state.board_data().health_score(),
            SubsystemId::BoardStatus => state.board_status().health_score(),
            SubsystemId::Quadrant0 => state.quadrants()[0].health_score(),
            SubsystemId::Quadrant1 => state.quadrants()[1].health_score(),
            SubsystemId::Quadrant2 => state.quadrants()[2].health_score(),
            SubsystemId::Quadrant3 => state.quadrants()[3].health_score(),
            SubsystemId::Qtrms => state.qtrm_health(),
            SubsystemId::Aqc => state.aqc_health(),
        }
    }

    pub fn breakdown(state: &ControllerState) -> HealthBreakdown {
        HealthBreakdown {
            entries: SubsystemId::ALL.map(|id| SubsystemHealth {
                id,
                value: Self::subsystem_value(state, id),
            }),
        }
    }

    pub fn overall_health(state: &ControllerState) -> f64 {
        Self::breakdown(state).weighted_average()
    }

    pub fn overall_status(state: &ControllerState) -> HealthStatus {
        classify(Self::overall_health(state))
    }
}
