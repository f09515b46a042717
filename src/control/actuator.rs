//! Bounded, rate-limited servo positioning.
//!
//! The controller owns the only copy of the current angle.  Targets outside
//! the mechanical limits are rejected before any motion; accepted targets are
//! approached one degree at a time with a fixed pause between steps so the
//! petals never snap.
//!
//! ```text
//!   min_angle (92°)                         max_angle (145°)
//!   closed ◀────────── level n ... level 0 ──────────▶ open
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::app::ports::ServoPort;
use crate::error::{ActuatorError, ConfigError};

pub struct ActuatorController {
    current_angle: u8,
    min_angle: u8,
    max_angle: u8,
    step_delay_ms: u32,
}

impl ActuatorController {
    /// Build a controller that assumes the servo is resting at `rest_angle`.
    pub fn new(min_angle: u8, max_angle: u8, rest_angle: u8, step_delay_ms: u32) -> Self {
        Self {
            current_angle: rest_angle.clamp(min_angle, max_angle),
            min_angle,
            max_angle,
            step_delay_ms,
        }
    }

    pub fn current_angle(&self) -> u8 {
        self.current_angle
    }

    pub fn bounds(&self) -> (u8, u8) {
        (self.min_angle, self.max_angle)
    }

    /// Step towards `target`, blocking `|target - current| * step_delay`.
    ///
    /// Out-of-range targets leave both the servo and the stored angle untouched.
    pub fn move_to(
        &mut self,
        target: i32,
        servo: &mut impl ServoPort,
        delay: &mut impl DelayNs,
    ) -> Result<(), ActuatorError> {
        if target < i32::from(self.min_angle) || target > i32::from(self.max_angle) {
            return Err(ActuatorError::OutOfRange {
                target,
                min: self.min_angle,
                max: self.max_angle,
            });
        }
        let target = target as u8;
        if target == self.current_angle {
            return Ok(());
        }

        debug!("Actuator: {}° -> {}°", self.current_angle, target);
        let mut angle = self.current_angle;
        while angle != target {
            angle = if angle < target { angle + 1 } else { angle - 1 };
            servo.set_angle(angle)?;
            // Stored angle always equals the last angle the servo accepted.
            self.current_angle = angle;
            delay.delay_ms(self.step_delay_ms);
        }
        Ok(())
    }

    /// Angle for a level: level 0 is fully open, level `n` closes by whole
    /// steps of `(max - min) / n` degrees.
    pub fn angle_for_level(&self, level: u16, num_levels: u16) -> Result<i32, ConfigError> {
        if num_levels == 0 {
            return Err(ConfigError::ZeroLevels);
        }
        let step = i32::from(self.max_angle - self.min_angle) / i32::from(num_levels);
        Ok(i32::from(self.max_angle) - i32::from(level) * step)
    }

    /// Move to the angle for `level`.
    pub fn apply_level(
        &mut self,
        level: u16,
        num_levels: u16,
        servo: &mut impl ServoPort,
        delay: &mut impl DelayNs,
    ) -> crate::error::Result<()> {
        let target = self.angle_for_level(level, num_levels)?;
        self.move_to(target, servo, delay)?;
        info!("Actuator: level {}/{} at {}°", level, num_levels, self.current_angle);
        Ok(())
    }
}
