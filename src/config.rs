//! System configuration parameters
//!
//! All tunable parameters for the AirFlower device.  Thresholds and mode
//! are overwritten at runtime from the threshold control points; the rest
//! are fixed for the device class.

use serde::{Deserialize, Serialize};

use crate::control::intensity::{CalculationMode, Thresholds};
use crate::error::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity ---
    /// Local name used in the advertising descriptor.
    pub device_name: heapless::String<24>,
    /// Sensor address in `AA:BB:CC:DD:EE:FF` notation (most significant first).
    pub sensor_address: heapless::String<17>,

    // --- Thresholds (initial values, replaced by the sync task) ---
    pub co2_min_ppm: u16,
    pub co2_max_ppm: u16,
    pub tvoc_min_ppb: u16,
    pub tvoc_max_ppb: u16,
    /// Number of intensity levels above zero.
    pub num_levels: u16,
    /// Raw calculation mode (see [`CalculationMode`]).
    pub mode: u8,

    // --- Actuator ---
    /// Mechanical lower limit of the servo (degrees).
    pub min_angle: u8,
    /// Mechanical upper limit of the servo (degrees).
    pub max_angle: u8,
    /// Angle the servo is assumed to be at after power-on.
    pub rest_angle: u8,
    /// Pause between single-degree steps (milliseconds).
    pub servo_step_delay_ms: u32,
    /// Number of open/close sweeps run at startup.
    pub self_test_cycles: u8,

    // --- Radio ---
    /// Minimum time between advertising windows while no base station is connected.
    pub advertise_retry_ms: u32,
    /// Length of one advertising window.
    pub advertise_window_ms: u32,
    /// Pause after tearing down connections before advertising.
    pub advertise_settle_ms: u32,
    /// Advertising interval handed to the transport.
    pub advertise_interval_ms: u32,
    /// Length of one scan pass for the sensor.
    pub scan_timeout_ms: u32,

    // --- Task intervals ---
    pub sensor_read_interval_ms: u32,
    pub threshold_sync_interval_ms: u32,
    pub level_update_interval_ms: u32,
    pub telemetry_interval_ms: u32,
    /// Idle delay at the end of every control-loop iteration.
    pub idle_delay_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        let _ = device_name.push_str("CSSE4011 FLOWER");
        let mut sensor_address = heapless::String::new();
        let _ = sensor_address.push_str("C8:AE:54:01:AC:A9");

        Self {
            device_name,
            sensor_address,

            // Thresholds
            co2_min_ppm: 400,
            co2_max_ppm: 2000,
            tvoc_min_ppb: 0,
            tvoc_max_ppb: 2000,
            num_levels: 10,
            mode: CalculationMode::Max as u8,

            // Actuator (fully open at 145°, closed towards 92°)
            min_angle: 92,
            max_angle: 145,
            rest_angle: 145,
            servo_step_delay_ms: 10,
            self_test_cycles: 3,

            // Radio
            advertise_retry_ms: 10_000,
            advertise_window_ms: 2_000,
            advertise_settle_ms: 200,
            advertise_interval_ms: 100,
            scan_timeout_ms: 1_000,

            // Tasks
            sensor_read_interval_ms: 500,
            threshold_sync_interval_ms: 1_000,
            level_update_interval_ms: 1_000,
            telemetry_interval_ms: 1_000,
            idle_delay_ms: 10,
        }
    }
}

impl SystemConfig {
    /// Initial thresholds before the first sync.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            co2_min: self.co2_min_ppm,
            co2_max: self.co2_max_ppm,
            tvoc_min: self.tvoc_min_ppb,
            tvoc_max: self.tvoc_max_ppb,
            num_levels: self.num_levels,
            mode: self.mode,
        }
    }

    /// Reject static parameters the device cannot run with.
    ///
    /// Threshold ordering is deliberately not checked here: it is
    /// runtime data and is caught when a level is computed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_levels == 0 {
            return Err(ConfigError::ZeroLevels);
        }
        if self.min_angle >= self.max_angle {
            return Err(ConfigError::Invalid("min_angle must be below max_angle"));
        }
        if !(self.min_angle..=self.max_angle).contains(&self.rest_angle) {
            return Err(ConfigError::Invalid("rest_angle outside servo limits"));
        }
        if self.advertise_window_ms == 0 {
            return Err(ConfigError::Invalid("advertise_window_ms is zero"));
        }
        if self.scan_timeout_ms == 0 {
            return Err(ConfigError::Invalid("scan_timeout_ms is zero"));
        }
        Ok(())
    }
}
