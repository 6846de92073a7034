pub mod board;
pub mod channel;
pub mod controller;
pub mod quadrant;
pub mod thermal;

pub use board::{BoardCheck, BoardData, BoardDataState, BoardStatus, BoardStatusState, CheckResult};
pub use channel::{BitStatus, Channel, ChannelEvent, ChannelState, TripStatus};
pub use controller::{ApcuController, ControllerSignals};
pub use quadrant::{Quadrant, QuadrantSummary};
pub use thermal::{TemperatureMonitor, TemperatureStatus, ThermalState};

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const NUM_QUADRANTS: usize = 4;
pub const CHANNELS_PER_QUADRANT: usize = 16;
pub const TOTAL_CHANNELS: usize = NUM_QUADRANTS * CHANNELS_PER_QUADRANT;
pub const SUBSYSTEM_COUNT: usize = 10;

static_assertions::const_assert_eq!(TOTAL_CHANNELS, 64);

/// Closed interval used for every bounded quantity in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A random-walk profile: per-step delta range plus the hard bounds of the quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub delta: Bounds,
    pub bounds: Bounds,
}

impl Drift {
    pub const fn new(delta_min: f64, delta_max: f64, min: f64, max: f64) -> Self {
        Self {
            delta: Bounds::new(delta_min, delta_max),
            bounds: Bounds::new(min, max),
        }
    }

    pub fn apply<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        drift(value, self.delta, self.bounds, rng)
    }
}

/// Bounded drift: adds a uniform draw from `delta` and clamps the result into `bounds`.
///
/// Every drifting quantity in the unit goes through here, so the range
/// invariants hold by construction after any step.
pub fn drift<R: Rng + ?Sized>(value: f64, delta: Bounds, bounds: Bounds, rng: &mut R) -> f64 {
    let step = rng.gen_range(delta.min..=delta.max);
    let next = bounds.clamp(value + step);

    debug_assert!(
        bounds.contains(next),
        "Drifted value {} escaped bounds [{}, {}]",
        next, bounds.min, bounds.max
    );

    next
}

/// One Bernoulli trial with success probability `probability`.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.gen::<f64>() < probability
}

/// Named health contributors, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubsystemId {
    ApcuController,
    TemperatureMonitoring,
    BoardData,
    BoardStatus,
    Quadrant0,
    Quadrant1,
    Quadrant2,
    Quadrant3,
    Qtrms,
    Aqc,
}

impl SubsystemId {
    pub const ALL: [SubsystemId; SUBSYSTEM_COUNT] = [
        SubsystemId::ApcuController,
        SubsystemId::TemperatureMonitoring,
        SubsystemId::BoardData,
        SubsystemId::BoardStatus,
        SubsystemId::Quadrant0,
        SubsystemId::Quadrant1,
        SubsystemId::Quadrant2,
        SubsystemId::Quadrant3,
        SubsystemId::Qtrms,
        SubsystemId::Aqc,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SubsystemId::ApcuController => "APCU Controller",
            SubsystemId::TemperatureMonitoring => "Temperature Monitoring",
            SubsystemId::BoardData => "Board Data",
            SubsystemId::BoardStatus => "Board Status",
            SubsystemId::Quadrant0 => quadrant::QUADRANT_NAMES[0],
            SubsystemId::Quadrant1 => quadrant::QUADRANT_NAMES[1],
            SubsystemId::Quadrant2 => quadrant::QUADRANT_NAMES[2],
            SubsystemId::Quadrant3 => quadrant::QUADRANT_NAMES[3],
            SubsystemId::Qtrms => "QTRMs",
            SubsystemId::Aqc => "AQC",
        }
    }

    /// Weight of this contributor in the overall health average.
    pub fn weight(self) -> f64 {
        match self {
            SubsystemId::ApcuController | SubsystemId::BoardStatus => 0.10,
            SubsystemId::TemperatureMonitoring
            | SubsystemId::BoardData
            | SubsystemId::Qtrms
            | SubsystemId::Aqc => 0.05,
            SubsystemId::Quadrant0
            | SubsystemId::Quadrant1
            | SubsystemId::Quadrant2
            | SubsystemId::Quadrant3 => 0.15,
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.display_name() == name)
    }
}

pub trait Subsystem {
    type State: Clone + Serialize;

    /// Advance one tick. `degradation` is the unit-wide fault-rate multiplier in `[0, 1]`.
    fn step<R: Rng + ?Sized>(&mut self, degradation: f64, rng: &mut R);
    fn health_score(&self) -> f64;
    fn get_state(&self) -> Self::State;

    fn is_healthy(&self) -> bool {
        self.health_score() >= 90.0
    }
}
