//! Payload builders over a [`ControllerState`]. None of them mutate state.

use crate::health::{classify, HealthAggregator, HealthBreakdown};
use crate::protocol::{
    ApcuTelemetry, BoardDataReport, ChannelReport, FullTelemetry, HealthMessage, LinkStatusReport,
    QuadrantReport, SubsystemHealthMap, SubsystemMessage, TemperatureReport,
};
use crate::state::{ControllerState, AQC_CONTROLLERS, QTRM_GROUPS, UNIT_NAME, UNIT_VERSION};
use crate::subsystems::{Channel, Quadrant, Subsystem, SUBSYSTEM_COUNT};

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn health_message(state: &ControllerState) -> HealthMessage {
    let health = HealthAggregator::overall_health(state);
    HealthMessage {
        component_id: state.component_id().to_string(),
        color: classify(health).color().to_string(),
        size: round_to(health, 1),
    }
}

/// One message per named subsystem, each classified on its own value.
pub fn subsystem_messages(state: &ControllerState) -> [SubsystemMessage; SUBSYSTEM_COUNT] {
    let breakdown = HealthAggregator::breakdown(state);
    breakdown.entries().map(|entry| SubsystemMessage {
        component_id: state.component_id().to_string(),
        subsystem: entry.id.display_name().to_string(),
        color: entry.status().color().to_string(),
        size: round_to(entry.value, 1),
    })
}

pub fn subsystem_health_map(breakdown: &HealthBreakdown) -> SubsystemHealthMap {
    SubsystemHealthMap {
        entries: breakdown.entries().map(|entry| (entry.id, round_to(entry.value, 1))),
    }
}

pub fn full_telemetry(state: &ControllerState) -> FullTelemetry {
    let breakdown = HealthAggregator::breakdown(state);
    let health = breakdown.weighted_average();

    FullTelemetry {
        component_id: state.component_id().to_string(),
        color: classify(health).color().to_string(),
        size: round_to(health, 1),
        subsystem_health: subsystem_health_map(&breakdown),
        apcu_telemetry: apcu_telemetry(state),
    }
}

fn apcu_telemetry(state: &ControllerState) -> ApcuTelemetry {
    let controller = state.controller();
    let thermal = state.thermal().get_state();
    let board_data = state.board_data();

    ApcuTelemetry {
        version: UNIT_VERSION,
        unit: UNIT_NAME,
        link_status: LinkStatusReport::from(controller.link_status()),
        sequence_on: controller.sequence_on(),
        array_voltage: round_to(controller.array_voltage(), 2),
        array_current: round_to(controller.array_current(), 2),
        temperature: TemperatureReport {
            sensor_a: round_to(thermal.sensor_a_c, 2),
            sensor_b: round_to(thermal.sensor_b_c, 2),
            sensor_c: round_to(thermal.sensor_c_c, 2),
            status: thermal.status,
        },
        board_data: BoardDataReport {
            input_voltage: round_to(board_data.input_voltage(), 2),
            current: round_to(board_data.input_current(), 2),
        },
        mode_status: state.mode_status(),
        board_status: state.board_status().get_state(),
        quadrants: core::array::from_fn(|q| quadrant_report(&state.quadrants()[q])),
        qtrm_groups: &QTRM_GROUPS,
        aqc_controllers: &AQC_CONTROLLERS,
    }
}

fn quadrant_report(quadrant: &Quadrant) -> QuadrantReport {
    QuadrantReport {
        name: quadrant.name(),
        code: quadrant.code(),
        health: round_to(quadrant.health_score(), 1),
        active: quadrant.active_count(),
        tripped: quadrant.tripped_count(),
        faulted: quadrant.faulted_count(),
        channels: core::array::from_fn(|ch| channel_report(&quadrant.channels()[ch])),
    }
}

fn channel_report(channel: &Channel) -> ChannelReport {
    ChannelReport {
        ch: channel.index(),
        on: channel.is_on(),
        trip: channel.trip_status(),
        bit: channel.bit_status(),
        voltage: round_to(channel.voltage(), 2),
        current: round_to(channel.current(), 2),
    }
}

/// Decides which ticks carry the full telemetry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetrySchedule {
    enabled: bool,
    every: u32,
}

impl TelemetrySchedule {
    pub fn new(enabled: bool, every: u32) -> Self {
        Self {
            enabled,
            every: every.max(1),
        }
    }

    pub fn should_send_full(&self, tick: u64) -> bool {
        self.enabled && tick % u64::from(self.every) == 0
    }
}

impl Default for TelemetrySchedule {
    fn default() -> Self {
        Self::new(true, 5)
    }
}
