use super::{chance, Bounds, Drift, Subsystem};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const NOMINAL_INPUT_VOLTAGE: f64 = 27.85;
const NOMINAL_INPUT_CURRENT: f64 = 5.33;

const INPUT_VOLTAGE_DRIFT: Drift = Drift::new(-0.15, 0.10, 25.0, 30.0);
const INPUT_CURRENT_DRIFT: Drift = Drift::new(-0.10, 0.08, 3.0, 8.0);

const HEALTHY_INPUT_VOLTAGE: Bounds = Bounds::new(26.5, 29.5);
const INPUT_VOLTAGE_PENALTY: f64 = 30.0;

const BASE_CHECK_FAILURE_PROBABILITY: f64 = 0.003;
const CHECK_RECOVERY_PROBABILITY: f64 = 0.1;

pub const BOARD_CHECK_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDataState {
    pub input_voltage: f64,
    pub input_current: f64,
}

/// Board input supply readings.
#[derive(Debug, Clone)]
pub struct BoardData {
    state: BoardDataState,
}

impl BoardData {
    pub fn new() -> Self {
        Self {
            state: BoardDataState {
                input_voltage: NOMINAL_INPUT_VOLTAGE,
                input_current: NOMINAL_INPUT_CURRENT,
            },
        }
    }

    pub fn input_voltage(&self) -> f64 {
        self.state.input_voltage
    }

    pub fn input_current(&self) -> f64 {
        self.state.input_current
    }

    pub fn set_input_voltage(&mut self, volts: f64) {
        self.state.input_voltage = INPUT_VOLTAGE_DRIFT.bounds.clamp(volts);
    }
}

impl Default for BoardData {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for BoardData {
    type State = BoardDataState;

    fn step<R: Rng + ?Sized>(&mut self, _degradation: f64, rng: &mut R) {
        self.state.input_voltage = INPUT_VOLTAGE_DRIFT.apply(self.state.input_voltage, rng);
        self.state.input_current = INPUT_CURRENT_DRIFT.apply(self.state.input_current, rng);
    }

    fn health_score(&self) -> f64 {
        if HEALTHY_INPUT_VOLTAGE.contains(self.state.input_voltage) {
            100.0
        } else {
            100.0 - INPUT_VOLTAGE_PENALTY
        }
    }

    fn get_state(&self) -> Self::State {
        self.state.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckResult {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardCheck {
    CrcUserFlash,
    CrcFactoryFlash,
    CrcProgramFlash,
    Cbit,
    Pbit,
    BoardSettingCheck,
}

impl BoardCheck {
    pub const ALL: [BoardCheck; BOARD_CHECK_COUNT] = [
        BoardCheck::CrcUserFlash,
        BoardCheck::CrcFactoryFlash,
        BoardCheck::CrcProgramFlash,
        BoardCheck::Cbit,
        BoardCheck::Pbit,
        BoardCheck::BoardSettingCheck,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStatusState {
    pub crc_user_flash: CheckResult,
    pub crc_factory_flash: CheckResult,
    pub crc_program_flash: CheckResult,
    pub cbit: CheckResult,
    pub pbit: CheckResult,
    pub board_setting_check: CheckResult,
}

/// The six board-level self checks (flash CRCs, CBIT, PBIT, settings).
#[derive(Debug, Clone)]
pub struct BoardStatus {
    checks: [CheckResult; BOARD_CHECK_COUNT],
}

impl BoardStatus {
    pub fn new() -> Self {
        Self {
            checks: [CheckResult::Pass; BOARD_CHECK_COUNT],
        }
    }

    pub fn check(&self, check: BoardCheck) -> CheckResult {
        self.checks[check.slot()]
    }

    pub fn set_check(&mut self, check: BoardCheck, result: CheckResult) {
        self.checks[check.slot()] = result;
    }

    pub fn pass_count(&self) -> usize {
        self.checks.iter().filter(|&&c| c == CheckResult::Pass).count()
    }
}

impl Default for BoardStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for BoardStatus {
    type State = BoardStatusState;

    fn step<R: Rng + ?Sized>(&mut self, degradation: f64, rng: &mut R) {
        if chance(rng, BASE_CHECK_FAILURE_PROBABILITY * (1.0 + degradation)) {
            let check = BoardCheck::ALL[rng.gen_range(0..BOARD_CHECK_COUNT)];
            self.set_check(check, CheckResult::Fail);
            debug!(?check, "board check failed");
        }

        // A check failed above is already eligible for recovery this tick
        for result in &mut self.checks {
            if *result == CheckResult::Fail && chance(rng, CHECK_RECOVERY_PROBABILITY) {
                *result = CheckResult::Pass;
            }
        }
    }

    fn health_score(&self) -> f64 {
        self.pass_count() as f64 / BOARD_CHECK_COUNT as f64 * 100.0
    }

    fn get_state(&self) -> Self::State {
        BoardStatusState {
            crc_user_flash: self.check(BoardCheck::CrcUserFlash),
            crc_factory_flash: self.check(BoardCheck::CrcFactoryFlash),
            crc_program_flash: self.check(BoardCheck::CrcProgramFlash),
            cbit: self.check(BoardCheck::Cbit),
            pbit: self.check(BoardCheck::Pbit),
            board_setting_check: self.check(BoardCheck::BoardSettingCheck),
        }
    }
}
