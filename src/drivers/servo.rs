//! Positional hobby-servo driver (50 Hz LEDC PWM).
//!
//! Maps 0–180° onto a 500–2500 µs pulse in a 20 ms frame.  This driver is
//! a dumb actuator: range limits and stepping belong to the
//! [`ActuatorController`](crate::control::actuator::ActuatorController).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the LEDC channel via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

const PERIOD_US: u32 = 1_000_000 / pins::SERVO_PWM_FREQ_HZ;

pub struct ServoDriver {
    channel: u32,
    angle: Option<u8>,
    duty: u32,
}

impl Default for ServoDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoDriver {
    pub fn new() -> Self {
        Self {
            channel: hw_init::LEDC_CH_SERVO,
            angle: None,
            duty: 0,
        }
    }

    /// Pulse width for an angle, clamped to 180°.
    pub fn pulse_us(degrees: u8) -> u32 {
        let degrees = u32::from(degrees.min(180));
        pins::SERVO_MIN_PULSE_US
            + degrees * (pins::SERVO_MAX_PULSE_US - pins::SERVO_MIN_PULSE_US) / 180
    }

    /// LEDC duty for an angle at the configured resolution.
    pub fn duty_for(degrees: u8) -> u32 {
        Self::pulse_us(degrees) * (hw_init::SERVO_DUTY_MAX + 1) / PERIOD_US
    }

    pub fn set_angle(&mut self, degrees: u8) -> Result<(), ActuatorError> {
        let duty = Self::duty_for(degrees);
        if !hw_init::ledc_set(self.channel, duty) {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.duty = duty;
        self.angle = Some(degrees);
        Ok(())
    }

    /// Last angle written, `None` before the first write.
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }

    pub fn current_duty(&self) -> u32 {
        self.duty
    }
}
