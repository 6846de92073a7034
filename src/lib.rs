//! # APCU Simulator
//!
//! Health simulation and telemetry engine for an Antenna Power Control Unit:
//! 64 power channels across four quadrants, a controller with per-quadrant
//! links, temperature sensors, board supply readings and six board self checks.
//!
//! ## Features
//!
//! - **Stochastic subsystem evolution**: bounded random walks and rare trip/fault events
//!   scaled by a unit-wide degradation factor
//! - **Hierarchical health**: channel → quadrant → QTRM/AQC groupings → weighted overall score
//! - **Status classification**: five health classes with fixed display colors
//! - **JSON telemetry**: basic health, per-subsystem health and full unit telemetry
//! - **Deterministic runs**: every step takes an injected random source
//!
//! ## Quick Start
//!
//! ```rust
//! use apcusim::{ApcuAgent, ComponentId, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(ComponentId::new("antenna_1").unwrap());
//! let mut agent = ApcuAgent::seeded(&config, 42);
//! agent.start();
//!
//! if let Ok(Some(frames)) = agent.update() {
//!     for frame in &frames {
//!         println!("{}", frame.payload);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`subsystems`] - Channel, quadrant, thermal, board and controller models
//! - [`state`] - The complete unit state and its tick algorithm
//! - [`health`] - Weighted aggregation and status classification
//! - [`telemetry`] - Payload builders
//! - [`protocol`] - Wire types, framing and inbound validation
//! - [`agent`] - Tick loop driver producing per-tick frames
//! - [`config`] - Simulator configuration

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::new_without_default)]

pub mod agent;
pub mod config;
pub mod health;
pub mod protocol;
pub mod state;
pub mod subsystems;
pub mod telemetry;

// Re-export main public types for convenience
pub use agent::{ApcuAgent, Frame, FrameKind};
pub use config::{ComponentId, SimulationMode, SimulatorConfig, TransportKind};
pub use health::{classify, color_for, HealthAggregator, HealthStatus};
pub use state::ControllerState;
pub use subsystems::{Channel, Quadrant, Subsystem, SubsystemId};
