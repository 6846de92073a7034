//! Wire payloads, framing and inbound validation.
//!
//! Three outbound shapes share the `component_id`/`color`/`size` core, so a
//! receiver that only understands health updates can consume all of them.

use crate::config::TransportKind;
use crate::health::HealthStatus;
use crate::state::ModeStatus;
use crate::subsystems::{
    BitStatus, BoardStatusState, SubsystemId, TemperatureStatus, TripStatus, CHANNELS_PER_QUADRANT,
    NUM_QUADRANTS, SUBSYSTEM_COUNT,
};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Largest UDP payload over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;
pub const MAX_LINE_SIZE: usize = 256 * 1024;
pub const FRAME_DELIMITER: u8 = b'\n';

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message of {size} bytes exceeds limit of {limit}")]
    MessageTooLarge { size: usize, limit: usize },
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("required field '{0}' missing or empty")]
    MissingField(&'static str),
    #[error("negative size {0}")]
    NegativeSize(f64),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Basic component health update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMessage {
    pub component_id: String,
    pub color: String,
    pub size: f64,
}

impl HealthMessage {
    /// Status implied by the color, when it is one of the five known colors.
    pub fn status(&self) -> Option<HealthStatus> {
        HealthStatus::from_color(&self.color)
    }
}

/// Health update for one named subsystem of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemMessage {
    pub component_id: String,
    pub subsystem: String,
    pub color: String,
    pub size: f64,
}

/// Subsystem name → health, serialized as a JSON object in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsystemHealthMap {
    pub entries: [(SubsystemId, f64); SUBSYSTEM_COUNT],
}

impl SubsystemHealthMap {
    pub fn get(&self, id: SubsystemId) -> Option<f64> {
        self.entries.iter().find(|(entry, _)| *entry == id).map(|(_, v)| *v)
    }
}

impl Serialize for SubsystemHealthMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, value) in &self.entries {
            map.serialize_entry(id.display_name(), value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullTelemetry {
    pub component_id: String,
    pub color: String,
    pub size: f64,
    pub subsystem_health: SubsystemHealthMap,
    pub apcu_telemetry: ApcuTelemetry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApcuTelemetry {
    pub version: &'static str,
    pub unit: &'static str,
    pub link_status: LinkStatusReport,
    pub sequence_on: bool,
    pub array_voltage: f64,
    pub array_current: f64,
    pub temperature: TemperatureReport,
    pub board_data: BoardDataReport,
    pub mode_status: ModeStatus,
    pub board_status: BoardStatusState,
    pub quadrants: [QuadrantReport; NUM_QUADRANTS],
    pub qtrm_groups: &'static [[u8; 6]; 12],
    pub aqc_controllers: &'static [u8; NUM_QUADRANTS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStatusReport {
    #[serde(rename = "Q0")]
    pub q0: bool,
    #[serde(rename = "Q1")]
    pub q1: bool,
    #[serde(rename = "Q2")]
    pub q2: bool,
    #[serde(rename = "Q3")]
    pub q3: bool,
}

impl From<[bool; NUM_QUADRANTS]> for LinkStatusReport {
    fn from(links: [bool; NUM_QUADRANTS]) -> Self {
        Self {
            q0: links[0],
            q1: links[1],
            q2: links[2],
            q3: links[3],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReport {
    pub sensor_a: f64,
    pub sensor_b: f64,
    pub sensor_c: f64,
    pub status: TemperatureStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDataReport {
    pub input_voltage: f64,
    pub current: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadrantReport {
    pub name: &'static str,
    pub code: &'static str,
    pub health: f64,
    pub active: u8,
    pub tripped: u8,
    pub faulted: u8,
    pub channels: [ChannelReport; CHANNELS_PER_QUADRANT],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelReport {
    pub ch: u8,
    pub on: bool,
    pub trip: TripStatus,
    pub bit: BitStatus,
    pub voltage: f64,
    pub current: f64,
}

/// Serializes payloads and applies the transport's framing.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    transport: TransportKind,
}

impl FrameCodec {
    pub fn new(transport: TransportKind) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    fn limit(&self) -> usize {
        match self.transport {
            TransportKind::Tcp => MAX_LINE_SIZE,
            TransportKind::Udp => MAX_DATAGRAM_SIZE,
        }
    }

    /// Serialize to compact JSON, without any delimiter.
    pub fn serialize<T: Serialize>(&self, payload: &T) -> Result<String, ProtocolError> {
        let json = serde_json::to_string(payload)?;
        let size = json.len() + usize::from(self.transport == TransportKind::Tcp);
        if size > self.limit() {
            return Err(ProtocolError::MessageTooLarge {
                size,
                limit: self.limit(),
            });
        }
        Ok(json)
    }

    /// Bytes to put on the wire for one serialized payload.
    pub fn frame(&self, json: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(json.len() + 1);
        bytes.extend_from_slice(json.as_bytes());
        if self.transport == TransportKind::Tcp {
            bytes.push(FRAME_DELIMITER);
        }
        bytes
    }
}

/// Read one newline-delimited frame into `line`, replacing its contents.
///
/// Returns `Ok(false)` at end of stream. At most `MAX_LINE_SIZE + 1` bytes are
/// buffered; a frame that reaches that without a delimiter is rejected.
pub async fn read_frame<R>(reader: &mut R, line: &mut Vec<u8>) -> Result<bool, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let limit = MAX_LINE_SIZE + 1;
    let read = (&mut *reader).take(limit as u64).read_until(FRAME_DELIMITER, line).await?;
    if read == 0 {
        return Ok(false);
    }
    if line.len() >= limit && line.last() != Some(&FRAME_DELIMITER) {
        return Err(ProtocolError::MessageTooLarge {
            size: line.len(),
            limit: MAX_LINE_SIZE,
        });
    }
    Ok(true)
}

/// Parse and validate one inbound frame as a health update.
///
/// Accepts any of the three outbound shapes; fields other than
/// `component_id`, `color` and `size` are ignored.
pub fn parse_health_message(data: &[u8]) -> Result<HealthMessage, ProtocolError> {
    let trimmed = trim_whitespace(data);
    if trimmed.len() > MAX_LINE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: trimmed.len(),
            limit: MAX_LINE_SIZE,
        });
    }

    let value: serde_json::Value = serde_json::from_slice(trimmed)?;
    let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;

    let component_id = object
        .get("component_id")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(ProtocolError::MissingField("component_id"))?;
    let color = object
        .get("color")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(ProtocolError::MissingField("color"))?;
    let size = object
        .get("size")
        .and_then(serde_json::Value::as_f64)
        .ok_or(ProtocolError::MissingField("size"))?;

    if size < 0.0 {
        return Err(ProtocolError::NegativeSize(size));
    }

    Ok(HealthMessage {
        component_id: component_id.to_string(),
        color: color.to_string(),
        size,
    })
}

/// Subsystem name of an inbound frame, when it carries one.
pub fn subsystem_of(data: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(trim_whitespace(data)).ok()?;
    value.get("subsystem")?.as_str().map(str::to_string)
}

fn trim_whitespace(data: &[u8]) -> &[u8] {
    let start = data.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(data.len());
    let end = data.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &data[start..end]
}
