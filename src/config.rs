use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 12345;
const DEFAULT_INTERVAL_MS: u64 = 2000;
const DEFAULT_FULL_TELEMETRY_EVERY: u32 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("component id must not be empty")]
    EmptyComponentId,
    #[error("unknown simulation mode '{0}' (expected nominal, degraded or critical)")]
    UnknownMode(String),
    #[error("unknown transport '{0}' (expected tcp or udp)")]
    UnknownTransport(String),
    #[error("update interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),
    #[error("full telemetry period must be at least one tick")]
    InvalidTelemetryPeriod,
}

/// Caller-supplied identifier of the simulated component. Opaque to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Any non-empty string is accepted.
    pub fn new(id: &str) -> Result<Self, ConfigError> {
        if id.is_empty() {
            return Err(ConfigError::EmptyComponentId);
        }
        Ok(ComponentId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl core::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Starting condition of the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    #[default]
    Nominal,
    Degraded,
    Critical,
}

impl SimulationMode {
    pub fn initial_degradation(self) -> f64 {
        match self {
            SimulationMode::Nominal => 0.0,
            SimulationMode::Degraded => 0.3,
            SimulationMode::Critical => 0.7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SimulationMode::Nominal => "nominal",
            SimulationMode::Degraded => "degraded",
            SimulationMode::Critical => "critical",
        }
    }
}

impl core::str::FromStr for SimulationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nominal" => Ok(SimulationMode::Nominal),
            "degraded" => Ok(SimulationMode::Degraded),
            "critical" => Ok(SimulationMode::Critical),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// How frames leave the process: newline-delimited over a stream, or one per datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Tcp,
    Udp,
}

impl core::str::FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(TransportKind::Tcp),
            "udp" => Ok(TransportKind::Udp),
            _ => Err(ConfigError::UnknownTransport(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub component_id: ComponentId,
    pub host: String,
    pub port: u16,
    pub interval_ms: u64,
    pub mode: SimulationMode,
    pub transport: TransportKind,
    pub full_telemetry: bool,
    pub full_telemetry_every: u32,
    pub verbose: bool,
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            component_id: ComponentId::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            interval_ms: DEFAULT_INTERVAL_MS,
            mode: SimulationMode::Nominal,
            transport: TransportKind::Tcp,
            full_telemetry: true,
            full_telemetry_every: DEFAULT_FULL_TELEMETRY_EVERY,
            verbose: true,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn new(component_id: ComponentId) -> Self {
        Self {
            component_id,
            ..Self::default()
        }
    }

    /// Convert a user-facing interval in seconds.
    pub fn set_interval_secs(&mut self, seconds: f64) -> Result<(), ConfigError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(ConfigError::InvalidInterval(seconds));
        }
        self.interval_ms = ((seconds * 1000.0).round() as u64).max(1);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.component_id.as_str().is_empty() {
            return Err(ConfigError::EmptyComponentId);
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::InvalidInterval(0.0));
        }
        if self.full_telemetry_every == 0 {
            return Err(ConfigError::InvalidTelemetryPeriod);
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
