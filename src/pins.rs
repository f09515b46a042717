//! GPIO / peripheral pin assignments for the AirFlower board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Petal servo (standard 50 Hz hobby servo)
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the servo signal line.
pub const SERVO_PWM_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Indicator outputs (active HIGH)
// ---------------------------------------------------------------------------

/// Indicator A: mid band.
pub const INDICATOR_A_GPIO: i32 = 25;
/// Indicator B: upper band.
pub const INDICATOR_B_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC timer resolution for the servo (bits).  14 bits gives ~1.2 µs steps
/// at 50 Hz.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// Pulse width at 0°.
pub const SERVO_MIN_PULSE_US: u32 = 500;
/// Pulse width at 180°.
pub const SERVO_MAX_PULSE_US: u32 = 2_500;
