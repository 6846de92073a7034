use super::{Drift, Subsystem};
use rand::Rng;
use serde::{Deserialize, Serialize};

const NOMINAL_TEMP_A_C: f64 = 41.79;
const NOMINAL_TEMP_B_C: f64 = 49.10;
const NOMINAL_TEMP_C_C: f64 = 42.78;

const SENSOR_DRIFT: Drift = Drift::new(-0.8, 0.6, 30.0, 70.0);

const CRITICAL_TEMP_C: f64 = 65.0;
const WARNING_TEMP_C: f64 = 60.0;
const ELEVATED_TEMP_C: f64 = 55.0;

const WARNING_PENALTY: f64 = 20.0;
const ELEVATED_PENALTY: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureStatus {
    Normal,
    Warning,
    Critical,
}

impl TemperatureStatus {
    /// Classify the hottest sensor reading.
    pub fn from_max_temp(max_temp_c: f64) -> Self {
        if max_temp_c > CRITICAL_TEMP_C {
            TemperatureStatus::Critical
        } else if max_temp_c > WARNING_TEMP_C {
            TemperatureStatus::Warning
        } else {
            TemperatureStatus::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalState {
    pub sensor_a_c: f64,
    pub sensor_b_c: f64,
    pub sensor_c_c: f64,
    pub status: TemperatureStatus,
}

/// Three board temperature sensors (A, B, C).
#[derive(Debug, Clone)]
pub struct TemperatureMonitor {
    state: ThermalState,
}

impl TemperatureMonitor {
    pub fn new() -> Self {
        Self {
            state: ThermalState {
                sensor_a_c: NOMINAL_TEMP_A_C,
                sensor_b_c: NOMINAL_TEMP_B_C,
                sensor_c_c: NOMINAL_TEMP_C_C,
                status: TemperatureStatus::Normal,
            },
        }
    }

    pub fn sensors(&self) -> [f64; 3] {
        [self.state.sensor_a_c, self.state.sensor_b_c, self.state.sensor_c_c]
    }

    pub fn max_temp(&self) -> f64 {
        self.sensors().into_iter().fold(f64::MIN, f64::max)
    }

    pub fn status(&self) -> TemperatureStatus {
        self.state.status
    }

    /// Overwrite sensor readings, clamped to the sensor range. Status follows.
    pub fn set_sensors(&mut self, readings: [f64; 3]) {
        let bounds = SENSOR_DRIFT.bounds;
        self.state.sensor_a_c = bounds.clamp(readings[0]);
        self.state.sensor_b_c = bounds.clamp(readings[1]);
        self.state.sensor_c_c = bounds.clamp(readings[2]);
        self.state.status = TemperatureStatus::from_max_temp(self.max_temp());
    }
}

impl Default for TemperatureMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for TemperatureMonitor {
    type State = ThermalState;

    fn step<R: Rng + ?Sized>(&mut self, _degradation: f64, rng: &mut R) {
        self.state.sensor_a_c = SENSOR_DRIFT.apply(self.state.sensor_a_c, rng);
        self.state.sensor_b_c = SENSOR_DRIFT.apply(self.state.sensor_b_c, rng);
        self.state.sensor_c_c = SENSOR_DRIFT.apply(self.state.sensor_c_c, rng);
        self.state.status = TemperatureStatus::from_max_temp(self.max_temp());
    }

    fn health_score(&self) -> f64 {
        let penalty: f64 = self
            .sensors()
            .iter()
            .map(|&t| {
                if t > WARNING_TEMP_C {
                    WARNING_PENALTY
                } else if t > ELEVATED_TEMP_C {
                    ELEVATED_PENALTY
                } else {
                    0.0
                }
            })
            .sum();
        f64::max(100.0 - penalty, 0.0)
    }

    fn get_state(&self) -> Self::State {
        self.state.clone()
    }
}
