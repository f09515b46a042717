//! Outbound application events.
//!
//! The [`FlowerController`](super::service::FlowerController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them.

use crate::control::intensity::Thresholds;
use crate::error::{ActuatorError, ConfigError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Startup finished; carries the servo angle after self-test.
    Started { angle: u8 },

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The intensity level changed.
    LevelChanged { from: u16, to: u16 },

    BaseStationConnected,
    BaseStationNotFound,
    SensorConnected,
    SensorLost,

    /// New thresholds were picked up from the control points.
    ThresholdsUpdated(Thresholds),

    /// Thresholds or mode were unusable; the previous level was kept.
    ConfigRejected(ConfigError),

    /// The actuator refused or failed a move.
    ActuatorRejected(ActuatorError),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryData {
    pub co2_ppm: u16,
    pub tvoc_ppb: u16,
    pub level: u16,
    pub num_levels: u16,
    pub angle: u8,
    pub sensor_connected: bool,
    pub base_station_connected: bool,
    /// Age of the last reading, `None` before the first one.
    pub reading_age_ms: Option<u64>,
}
