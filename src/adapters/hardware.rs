//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the servo and both indicator outputs, exposing them through
//! [`ServoPort`] and [`IndicatorPort`].  This is the only module in the
//! system that touches actual hardware.  On non-espidf targets, the
//! underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{IndicatorOutput, IndicatorPort, ServoPort};
use crate::drivers::servo::ServoDriver;
use crate::drivers::signal::SignalOutput;
use crate::error::ActuatorError;
use crate::pins;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    servo: ServoDriver,
    indicator_a: SignalOutput,
    indicator_b: SignalOutput,
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new(
            ServoDriver::new(),
            SignalOutput::new(pins::INDICATOR_A_GPIO),
            SignalOutput::new(pins::INDICATOR_B_GPIO),
        )
    }
}

impl HardwareAdapter {
    pub fn new(servo: ServoDriver, indicator_a: SignalOutput, indicator_b: SignalOutput) -> Self {
        Self {
            servo,
            indicator_a,
            indicator_b,
        }
    }

    pub fn servo(&self) -> &ServoDriver {
        &self.servo
    }

    pub fn indicators(&self) -> (bool, bool) {
        (self.indicator_a.is_high(), self.indicator_b.is_high())
    }
}

// ── ServoPort implementation ──────────────────────────────────

impl ServoPort for HardwareAdapter {
    fn set_angle(&mut self, degrees: u8) -> Result<(), ActuatorError> {
        self.servo.set_angle(degrees)
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl IndicatorPort for HardwareAdapter {
    fn digital_write(&mut self, output: IndicatorOutput, high: bool) {
        match output {
            IndicatorOutput::A => self.indicator_a.set(high),
            IndicatorOutput::B => self.indicator_b.set(high),
        }
    }
}
