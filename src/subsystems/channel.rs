use super::{chance, Bounds, Drift, Subsystem};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const VOLTAGE_DRIFT: Drift = Drift::new(-0.15, 0.10, 26.0, 29.0);
const CURRENT_DRIFT: Drift = Drift::new(-0.05, 0.05, 0.0, 1.0);

// Initial draw ranges at power-up
const NOMINAL_VOLTAGE: Bounds = Bounds::new(27.85, 28.15);
const NOMINAL_CURRENT: Bounds = Bounds::new(0.06, 0.70);

// Outside this band the channel loses health points
const HEALTHY_VOLTAGE: Bounds = Bounds::new(27.5, 28.5);

const BASE_TRIP_PROBABILITY: f64 = 0.002;
const TRIP_DEGRADATION_GAIN: f64 = 0.02;
const BASE_FAULT_PROBABILITY: f64 = 0.001;
const FAULT_DEGRADATION_GAIN: f64 = 0.015;
const TRIP_RECOVERY_PROBABILITY: f64 = 0.05;
const FAULT_RECOVERY_PROBABILITY: f64 = 0.03;

const POWER_OFF_PENALTY: f64 = 50.0;
const TRIP_PENALTY: f64 = 30.0;
const FAULT_PENALTY: f64 = 20.0;
const VOLTAGE_PENALTY: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripStatus {
    Normal,
    Tripped,
}

/// Built-in-test result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitStatus {
    Normal,
    Fault,
}

/// Every discrete change a channel can undergo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    Trip,
    TripCleared,
    Fault,
    FaultCleared,
    PowerOn,
    PowerOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    pub index: u8,
    pub quadrant: u8,
    pub on: bool,
    pub trip_status: TripStatus,
    pub bit_status: BitStatus,
    pub voltage: f64,
    pub current: f64,
}

#[derive(Debug, Clone)]
pub struct Channel {
    state: ChannelState,
}

impl Channel {
    pub fn new<R: Rng + ?Sized>(index: u8, quadrant: u8, rng: &mut R) -> Self {
        Self {
            state: ChannelState {
                index,
                quadrant,
                on: true,
                trip_status: TripStatus::Normal,
                bit_status: BitStatus::Normal,
                voltage: rng.gen_range(NOMINAL_VOLTAGE.min..=NOMINAL_VOLTAGE.max),
                current: rng.gen_range(NOMINAL_CURRENT.min..=NOMINAL_CURRENT.max),
            },
        }
    }

    /// Channel sitting at the middle of its nominal ranges, with no random draw.
    pub fn nominal(index: u8, quadrant: u8) -> Self {
        Self {
            state: ChannelState {
                index,
                quadrant,
                on: true,
                trip_status: TripStatus::Normal,
                bit_status: BitStatus::Normal,
                voltage: (NOMINAL_VOLTAGE.min + NOMINAL_VOLTAGE.max) / 2.0,
                current: (NOMINAL_CURRENT.min + NOMINAL_CURRENT.max) / 2.0,
            },
        }
    }

    pub fn index(&self) -> u8 {
        self.state.index
    }

    pub fn quadrant(&self) -> u8 {
        self.state.quadrant
    }

    pub fn is_on(&self) -> bool {
        self.state.on
    }

    pub fn trip_status(&self) -> TripStatus {
        self.state.trip_status
    }

    pub fn bit_status(&self) -> BitStatus {
        self.state.bit_status
    }

    pub fn voltage(&self) -> f64 {
        self.state.voltage
    }

    pub fn current(&self) -> f64 {
        self.state.current
    }

    pub fn is_tripped(&self) -> bool {
        self.state.trip_status == TripStatus::Tripped
    }

    pub fn is_faulted(&self) -> bool {
        self.state.bit_status == BitStatus::Fault
    }

    /// The only place channel status and power change.
    ///
    /// A trip always powers the channel off and clearing it powers it back on.
    /// `PowerOn` is refused while tripped.
    pub fn apply(&mut self, event: ChannelEvent) {
        let state = &mut self.state;
        match event {
            ChannelEvent::Trip => {
                state.trip_status = TripStatus::Tripped;
                state.on = false;
            }
            ChannelEvent::TripCleared => {
                state.trip_status = TripStatus::Normal;
                state.on = true;
            }
            ChannelEvent::Fault => state.bit_status = BitStatus::Fault,
            ChannelEvent::FaultCleared => state.bit_status = BitStatus::Normal,
            ChannelEvent::PowerOn => state.on = state.trip_status == TripStatus::Normal,
            ChannelEvent::PowerOff => state.on = false,
        }

        debug_assert!(
            !(state.trip_status == TripStatus::Tripped && state.on),
            "Channel Q{}/{} powered while tripped",
            state.quadrant, state.index
        );
    }

    fn drift_electrical<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.state.voltage = VOLTAGE_DRIFT.apply(self.state.voltage, rng);
        self.state.current = CURRENT_DRIFT.apply(self.state.current, rng);
    }

    fn log_event(&self, event: ChannelEvent) {
        debug!(
            quadrant = self.state.quadrant,
            channel = self.state.index,
            ?event,
            "channel status change"
        );
    }
}

impl Subsystem for Channel {
    type State = ChannelState;

    fn step<R: Rng + ?Sized>(&mut self, degradation: f64, rng: &mut R) {
        self.drift_electrical(rng);

        let trip_probability = BASE_TRIP_PROBABILITY + degradation * TRIP_DEGRADATION_GAIN;
        if chance(rng, trip_probability) && !self.is_tripped() {
            self.apply(ChannelEvent::Trip);
            self.log_event(ChannelEvent::Trip);
        }

        let fault_probability = BASE_FAULT_PROBABILITY + degradation * FAULT_DEGRADATION_GAIN;
        if chance(rng, fault_probability) && !self.is_faulted() {
            self.apply(ChannelEvent::Fault);
            self.log_event(ChannelEvent::Fault);
        }

        // Recovery draws only happen for channels that need them
        if self.is_tripped() && chance(rng, TRIP_RECOVERY_PROBABILITY) {
            self.apply(ChannelEvent::TripCleared);
            self.log_event(ChannelEvent::TripCleared);
        }

        if self.is_faulted() && chance(rng, FAULT_RECOVERY_PROBABILITY) {
            self.apply(ChannelEvent::FaultCleared);
            self.log_event(ChannelEvent::FaultCleared);
        }
    }

    fn health_score(&self) -> f64 {
        let mut score = 100.0;
        if !self.state.on {
            score -= POWER_OFF_PENALTY;
        }
        if self.is_tripped() {
            score -= TRIP_PENALTY;
        }
        if self.is_faulted() {
            score -= FAULT_PENALTY;
        }
        if !HEALTHY_VOLTAGE.contains(self.state.voltage) {
            score -= VOLTAGE_PENALTY;
        }
        f64::max(score, 0.0)
    }

    fn get_state(&self) -> Self::State {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_power_on_refused_while_tripped() {
        let mut channel = Channel::nominal(0, 0);
        channel.apply(ChannelEvent::Trip);
        channel.apply(ChannelEvent::PowerOn);
        assert!(!channel.is_on());

        channel.apply(ChannelEvent::TripCleared);
        assert!(channel.is_on());
    }

    #[test]
    fn test_worst_case_score_floors_at_zero() {
        let mut channel = Channel::nominal(3, 1);
        channel.apply(ChannelEvent::Trip);
        channel.apply(ChannelEvent::Fault);
        channel.state.voltage = 26.0;
        assert_eq!(channel.health_score(), 0.0);
    }

    #[test]
    fn test_initial_draw_within_nominal_band() {
        let mut rng = StdRng::seed_from_u64(5);
        for i in 0..16 {
            let channel = Channel::new(i, 0, &mut rng);
            assert!(NOMINAL_VOLTAGE.contains(channel.voltage()));
            assert!(NOMINAL_CURRENT.contains(channel.current()));
            assert_eq!(channel.health_score(), 100.0);
        }
    }
}
