use crate::config::SimulatorConfig;
use crate::health::{classify, HealthAggregator, HealthStatus};
use crate::protocol::{FrameCodec, ProtocolError};
use crate::state::{ControllerState, OperatingMode};
use crate::subsystems::{SubsystemId, SUBSYSTEM_COUNT};
use crate::telemetry::{self, TelemetrySchedule};
use heapless::Vec;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, trace, warn};

/// Health + one per subsystem + full telemetry.
pub const MAX_FRAMES_PER_TICK: usize = SUBSYSTEM_COUNT + 2;

pub type TickFrames = Vec<Frame, MAX_FRAMES_PER_TICK>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("per-tick frame buffer full")]
    FrameBufferFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Health,
    Subsystem(SubsystemId),
    FullTelemetry,
}

/// One serialized payload, without transport framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStats {
    pub running: bool,
    pub ticks: u64,
    pub frames_encoded: u64,
    pub full_telemetry_sent: u64,
    pub overall_health: f64,
    pub last_status: HealthStatus,
}

/// Drives one simulated APCU: owns its state and random source, and turns
/// every tick into the frames to transmit.
pub struct ApcuAgent<R: Rng = StdRng> {
    state: ControllerState,
    rng: R,
    codec: FrameCodec,
    schedule: TelemetrySchedule,
    stats: AgentStats,
    last_mode: OperatingMode,
}

impl ApcuAgent<StdRng> {
    pub fn seeded(config: &SimulatorConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(config: &SimulatorConfig) -> Self {
        Self::new(config, StdRng::from_entropy())
    }

    /// Seeded when the configuration carries a seed, entropy otherwise.
    pub fn from_config(config: &SimulatorConfig) -> Self {
        match config.seed {
            Some(seed) => Self::seeded(config, seed),
            None => Self::from_entropy(config),
        }
    }
}

impl<R: Rng> ApcuAgent<R> {
    pub fn new(config: &SimulatorConfig, mut rng: R) -> Self {
        let state = ControllerState::with_mode(config.component_id.clone(), config.mode, &mut rng);
        let overall_health = HealthAggregator::overall_health(&state);
        let last_mode = state.mode_status().operating;

        Self {
            state,
            rng,
            codec: FrameCodec::new(config.transport),
            schedule: TelemetrySchedule::new(config.full_telemetry, config.full_telemetry_every),
            stats: AgentStats {
                running: false,
                ticks: 0,
                frames_encoded: 0,
                full_telemetry_sent: 0,
                overall_health,
                last_status: classify(overall_health),
            },
            last_mode,
        }
    }

    pub fn start(&mut self) {
        self.stats.running = true;
        info!(
            component = %self.state.component_id(),
            degradation = self.state.degradation(),
            transport = ?self.codec.transport(),
            "APCU simulator started"
        );
    }

    /// Takes effect between ticks; a tick in progress always completes.
    pub fn stop(&mut self) {
        self.stats.running = false;
        info!(component = %self.state.component_id(), ticks = self.stats.ticks, "APCU simulator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.stats.running
    }

    /// Run one tick and encode everything due for it.
    ///
    /// All frames are serialized before this returns, so the caller never
    /// sees a payload built from a half-updated state.
    pub fn update(&mut self) -> Result<Option<TickFrames>, AgentError> {
        if !self.stats.running {
            return Ok(None);
        }

        let tick = self.stats.ticks;
        self.state.tick(&mut self.rng);
        self.track_transitions(tick);

        let frames = self.encode_frames(tick)?;
        self.stats.ticks = tick.wrapping_add(1);
        self.stats.frames_encoded += frames.len() as u64;
        self.stats.full_telemetry_sent +=
            frames.iter().filter(|f| f.kind == FrameKind::FullTelemetry).count() as u64;

        Ok(Some(frames))
    }

    /// Encode the current state without advancing it.
    pub fn encode_frames(&self, tick: u64) -> Result<TickFrames, AgentError> {
        let mut frames = TickFrames::new();

        let health = self.codec.serialize(&telemetry::health_message(&self.state))?;
        push_frame(&mut frames, FrameKind::Health, health)?;

        for (id, message) in SubsystemId::ALL.into_iter().zip(telemetry::subsystem_messages(&self.state)) {
            let payload = self.codec.serialize(&message)?;
            push_frame(&mut frames, FrameKind::Subsystem(id), payload)?;
        }

        if self.schedule.should_send_full(tick) {
            let full = self.codec.serialize(&telemetry::full_telemetry(&self.state))?;
            push_frame(&mut frames, FrameKind::FullTelemetry, full)?;
        }

        Ok(frames)
    }

    fn track_transitions(&mut self, tick: u64) {
        let health = HealthAggregator::overall_health(&self.state);
        let status = classify(health);

        if status > self.stats.last_status {
            warn!(
                component = %self.state.component_id(),
                tick,
                from = %self.stats.last_status,
                to = %status,
                health,
                "health status worsened"
            );
        } else if status < self.stats.last_status {
            info!(component = %self.state.component_id(), tick, to = %status, health, "health status improved");
        }

        let mode = self.state.mode_status().operating;
        if mode != self.last_mode {
            info!(
                component = %self.state.component_id(),
                tick,
                ?mode,
                degradation = self.state.degradation(),
                "operating mode changed"
            );
            self.last_mode = mode;
        }

        trace!(tick, health, degradation = self.state.degradation(), "tick complete");

        self.stats.overall_health = health;
        self.stats.last_status = status;
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ControllerState {
        &mut self.state
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }
}

fn push_frame(frames: &mut TickFrames, kind: FrameKind, payload: String) -> Result<(), AgentError> {
    frames
        .push(Frame { kind, payload })
        .map_err(|_| AgentError::FrameBufferFull)
}
