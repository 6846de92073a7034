use super::{chance, Drift, Subsystem, NUM_QUADRANTS};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const NOMINAL_ARRAY_VOLTAGE: f64 = 27.87;
const NOMINAL_ARRAY_CURRENT: f64 = 22.35;

const ARRAY_VOLTAGE_DRIFT: Drift = Drift::new(-0.20, 0.15, 25.0, 30.0);
const ARRAY_CURRENT_DRIFT: Drift = Drift::new(-0.30, 0.25, 15.0, 30.0);

const BASE_LINK_FLIP_PROBABILITY: f64 = 0.005;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSignals {
    pub link_status: [bool; NUM_QUADRANTS],
    pub sequence_on: bool,
    pub array_voltage: f64,
    pub array_current: f64,
}

/// Controller-level signals: one link per quadrant, power sequencing and the array feed.
#[derive(Debug, Clone)]
pub struct ApcuController {
    state: ControllerSignals,
}

impl ApcuController {
    pub fn new() -> Self {
        Self {
            state: ControllerSignals {
                link_status: [true; NUM_QUADRANTS],
                sequence_on: true,
                array_voltage: NOMINAL_ARRAY_VOLTAGE,
                array_current: NOMINAL_ARRAY_CURRENT,
            },
        }
    }

    pub fn link_status(&self) -> [bool; NUM_QUADRANTS] {
        self.state.link_status
    }

    pub fn set_link(&mut self, quadrant: usize, up: bool) {
        if let Some(link) = self.state.link_status.get_mut(quadrant) {
            *link = up;
        }
    }

    pub fn links_up(&self) -> usize {
        self.state.link_status.iter().filter(|&&up| up).count()
    }

    pub fn sequence_on(&self) -> bool {
        self.state.sequence_on
    }

    pub fn array_voltage(&self) -> f64 {
        self.state.array_voltage
    }

    pub fn array_current(&self) -> f64 {
        self.state.array_current
    }
}

impl Default for ApcuController {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for ApcuController {
    type State = ControllerSignals;

    fn step<R: Rng + ?Sized>(&mut self, degradation: f64, rng: &mut R) {
        let flip_probability = BASE_LINK_FLIP_PROBABILITY * (1.0 + degradation);
        for (quadrant, link) in self.state.link_status.iter_mut().enumerate() {
            if chance(rng, flip_probability) {
                *link = !*link;
                debug!(quadrant, up = *link, "quadrant link toggled");
            }
        }

        self.state.array_voltage = ARRAY_VOLTAGE_DRIFT.apply(self.state.array_voltage, rng);
        self.state.array_current = ARRAY_CURRENT_DRIFT.apply(self.state.array_current, rng);
    }

    fn health_score(&self) -> f64 {
        self.links_up() as f64 / NUM_QUADRANTS as f64 * 100.0
    }

    fn get_state(&self) -> Self::State {
        self.state.clone()
    }
}
