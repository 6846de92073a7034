//! The complete APCU state and its per-tick evolution.

use crate::config::{ComponentId, SimulationMode};
use crate::subsystems::{
    chance, ApcuController, BoardData, BoardStatus, Bounds, Channel, Drift, Quadrant, Subsystem,
    TemperatureMonitor, CHANNELS_PER_QUADRANT, NUM_QUADRANTS, TOTAL_CHANNELS,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const UNIT_NAME: &str = "APCU 4 Left";
pub const UNIT_VERSION: &str = "1.0.0";

/// Channel numbering of the twelve quad transmit/receive modules.
pub const QTRM_GROUPS: [[u8; 6]; 12] = [
    [5, 8, 15, 18, 25, 28],
    [33, 43, 53, 63, 73, 83],
    [3, 7, 13, 17, 23, 27],
    [37, 47, 57, 67, 77, 87],
    [39, 49, 59, 69, 79, 89],
    [4, 9, 14, 19, 24, 29],
    [34, 44, 54, 64, 74, 84],
    [0, 1, 10, 11, 20, 21],
    [31, 41, 51, 61, 71, 81],
    [30, 40, 50, 60, 70, 80],
    [2, 6, 12, 16, 22, 26],
    [36, 46, 56, 66, 76, 88],
];

pub const AQC_CONTROLLERS: [u8; NUM_QUADRANTS] = [0, 1, 2, 3];

pub const DEGRADATION_BOUNDS: Bounds = Bounds::new(0.0, 1.0);
const DEGRADATION_DRIFT: Drift = Drift::new(-0.05, 0.03, 0.0, 1.0);
const DEGRADATION_DRIFT_PROBABILITY: f64 = 0.05;

const DEGRADED_MODE_THRESHOLD: f64 = 0.5;
const WARNING_MODE_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    Operating,
    Warning,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputVoltageLoss {
    #[serde(rename = "No Loss")]
    NoLoss,
    #[serde(rename = "Low Voltage")]
    LowVoltage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetSource {
    #[serde(rename = "Software Reset")]
    Software,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeStatus {
    pub operating: OperatingMode,
    pub loss_of_input_voltage: InputVoltageLoss,
    pub reset_source: ResetSource,
}

impl ModeStatus {
    pub fn from_degradation(degradation: f64) -> Self {
        let (operating, loss_of_input_voltage) = if degradation > DEGRADED_MODE_THRESHOLD {
            (OperatingMode::Degraded, InputVoltageLoss::LowVoltage)
        } else if degradation > WARNING_MODE_THRESHOLD {
            (OperatingMode::Warning, InputVoltageLoss::NoLoss)
        } else {
            (OperatingMode::Operating, InputVoltageLoss::NoLoss)
        };

        Self {
            operating,
            loss_of_input_voltage,
            reset_source: ResetSource::Software,
        }
    }
}

impl Default for ModeStatus {
    fn default() -> Self {
        Self {
            operating: OperatingMode::Operating,
            loss_of_input_voltage: InputVoltageLoss::NoLoss,
            reset_source: ResetSource::Software,
        }
    }
}

/// Everything one simulated APCU knows about itself.
///
/// QTRM and AQC health are never stored: they are evaluated from the
/// channel, link and quadrant state each time they are read.
#[derive(Debug, Clone)]
pub struct ControllerState {
    component_id: ComponentId,
    controller: ApcuController,
    thermal: TemperatureMonitor,
    board_data: BoardData,
    board_status: BoardStatus,
    quadrants: [Quadrant; NUM_QUADRANTS],
    degradation: f64,
    mode: ModeStatus,
}

impl ControllerState {
    /// Fresh unit at nominal constants. Channel electrical values are drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(component_id: ComponentId, degradation: f64, rng: &mut R) -> Self {
        Self {
            component_id,
            controller: ApcuController::new(),
            thermal: TemperatureMonitor::new(),
            board_data: BoardData::new(),
            board_status: BoardStatus::new(),
            quadrants: core::array::from_fn(|q| Quadrant::new(q as u8, rng)),
            degradation: DEGRADATION_BOUNDS.clamp(degradation),
            mode: ModeStatus::default(),
        }
    }

    pub fn with_mode<R: Rng + ?Sized>(component_id: ComponentId, mode: SimulationMode, rng: &mut R) -> Self {
        Self::new(component_id, mode.initial_degradation(), rng)
    }

    /// Advance simulated time by one step.
    ///
    /// Order: degradation drift, temperature, board data, board checks, links
    /// and array feed, then every quadrant, then the operating mode.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if chance(rng, DEGRADATION_DRIFT_PROBABILITY) {
            self.degradation = DEGRADATION_DRIFT.apply(self.degradation, rng);
        }

        let degradation = self.degradation;
        self.thermal.step(degradation, rng);
        self.board_data.step(degradation, rng);
        self.board_status.step(degradation, rng);
        self.controller.step(degradation, rng);

        for quadrant in &mut self.quadrants {
            quadrant.step(degradation, rng);
        }

        self.mode = ModeStatus::from_degradation(degradation);

        debug_assert!(
            DEGRADATION_BOUNDS.contains(self.degradation),
            "Degradation factor {} outside [0, 1]",
            self.degradation
        );
    }

    pub fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    pub fn controller(&self) -> &ApcuController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ApcuController {
        &mut self.controller
    }

    pub fn thermal(&self) -> &TemperatureMonitor {
        &self.thermal
    }

    pub fn thermal_mut(&mut self) -> &mut TemperatureMonitor {
        &mut self.thermal
    }

    pub fn board_data(&self) -> &BoardData {
        &self.board_data
    }

    pub fn board_data_mut(&mut self) -> &mut BoardData {
        &mut self.board_data
    }

    pub fn board_status(&self) -> &BoardStatus {
        &self.board_status
    }

    pub fn board_status_mut(&mut self) -> &mut BoardStatus {
        &mut self.board_status
    }

    pub fn quadrants(&self) -> &[Quadrant; NUM_QUADRANTS] {
        &self.quadrants
    }

    pub fn quadrants_mut(&mut self) -> &mut [Quadrant; NUM_QUADRANTS] {
        &mut self.quadrants
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.quadrants.iter().flat_map(|q| q.channels().iter())
    }

    pub fn degradation(&self) -> f64 {
        self.degradation
    }

    /// Pin the degradation factor; clamped into `[0, 1]`.
    pub fn set_degradation(&mut self, degradation: f64) {
        self.degradation = DEGRADATION_BOUNDS.clamp(degradation);
    }

    pub fn mode_status(&self) -> ModeStatus {
        self.mode
    }

    pub fn links_up(&self) -> usize {
        self.controller.links_up()
    }

    /// Unweighted mean of the four quadrant scores.
    pub fn mean_quadrant_health(&self) -> f64 {
        let total: f64 = self.quadrants.iter().map(Subsystem::health_score).sum();
        total / NUM_QUADRANTS as f64
    }

    /// Share of the best possible score across all 64 channels, as a percentage.
    pub fn qtrm_health(&self) -> f64 {
        let total: f64 = self.channels().map(Subsystem::health_score).sum();
        let max_possible = (NUM_QUADRANTS * CHANNELS_PER_QUADRANT) as f64 * 100.0;
        total / max_possible * 100.0
    }

    /// Half from the links, half from the mean quadrant health.
    pub fn aqc_health(&self) -> f64 {
        let link_term = self.links_up() as f64 / NUM_QUADRANTS as f64 * 50.0;
        let quadrant_term = self.mean_quadrant_health() / 100.0 * 50.0;
        link_term + quadrant_term
    }
}

impl Default for ControllerState {
    /// Nominal unit with an empty id and mid-range channel values; needs no RNG.
    fn default() -> Self {
        Self {
            component_id: ComponentId::default(),
            controller: ApcuController::new(),
            thermal: TemperatureMonitor::new(),
            board_data: BoardData::new(),
            board_status: BoardStatus::new(),
            quadrants: core::array::from_fn(|q| Quadrant::nominal(q as u8)),
            degradation: 0.0,
            mode: ModeStatus::default(),
        }
    }
}

static_assertions::const_assert_eq!(TOTAL_CHANNELS, NUM_QUADRANTS * CHANNELS_PER_QUADRANT);
