//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART on the device, stderr in the host simulation).
//! A dashboard-facing adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | CO2={}ppm TVOC={}ppb | level={}/{} angle={}\u{00b0} | \
                     sensor={} base={} | age_ms={:?}",
                    t.co2_ppm,
                    t.tvoc_ppb,
                    t.level,
                    t.num_levels,
                    t.angle,
                    if t.sensor_connected { "UP" } else { "DOWN" },
                    if t.base_station_connected { "UP" } else { "DOWN" },
                    t.reading_age_ms,
                );
            }
            AppEvent::LevelChanged { from, to } => {
                info!("LEVEL | {} -> {}", from, to);
            }
            AppEvent::Started { angle } => {
                info!("START | angle={}\u{00b0}", angle);
            }
            AppEvent::BaseStationConnected => info!("RADIO | base station connected"),
            AppEvent::BaseStationNotFound => info!("RADIO | base station not found"),
            AppEvent::SensorConnected => info!("RADIO | sensor connected"),
            AppEvent::SensorLost => warn!("RADIO | sensor lost"),
            AppEvent::ThresholdsUpdated(t) => {
                info!(
                    "CONFIG | CO2 {}..{} TVOC {}..{} levels={} mode={}",
                    t.co2_min, t.co2_max, t.tvoc_min, t.tvoc_max, t.num_levels, t.mode
                );
            }
            AppEvent::ConfigRejected(e) => warn!("CONFIG | rejected: {}", e),
            AppEvent::ActuatorRejected(e) => warn!("ACTUATOR | rejected: {}", e),
        }
    }
}
