//! Unified error types for the AirFlower firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the task runner and event sink without allocation.
//!
//! | Category  | Recovery                                          |
//! |-----------|---------------------------------------------------|
//! | Radio     | drop the affected connection, retry next tick     |
//! | Config    | report, skip this tick's level update             |
//! | Actuator  | reject at the boundary, no partial motion         |
//! | Init      | fatal — propagates out of the control loop        |

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A radio operation failed (transient).
    Radio(RadioError),
    /// Thresholds or mode are unusable for this tick.
    Config(ConfigError),
    /// An actuator command was rejected or failed.
    Actuator(ActuatorError),
    /// Peripheral or configuration initialisation failed at startup.
    Init(&'static str),
}

impl Error {
    /// Only initialisation failures stop the control loop; everything
    /// else degrades and retries.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Init(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The stack ran out of memory while collecting scan results.
    OutOfMemory,
    /// Scanning could not be started or aborted early.
    ScanFailed,
    /// Connection attempt to a discovered peer failed.
    ConnectFailed,
    /// Advertising could not be started.
    AdvertisingFailed,
    /// The connection dropped before or during the operation.
    NotConnected,
    /// The peer does not expose the requested service or characteristic.
    ServiceUnavailable,
    /// The characteristic value had an unexpected width.
    MalformedValue,
    /// Requested role change conflicts with the current radio role.
    RoleConflict,
    /// The stack refused to tear a link down.
    DisconnectFailed,
    /// A client tried to write a characteristic that only the device sets.
    ReadOnly,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory during scan"),
            Self::ScanFailed => write!(f, "scan failed"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::AdvertisingFailed => write!(f, "advertising failed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::ServiceUnavailable => write!(f, "service unavailable"),
            Self::MalformedValue => write!(f, "malformed characteristic value"),
            Self::RoleConflict => write!(f, "radio role conflict"),
            Self::DisconnectFailed => write!(f, "disconnect failed"),
            Self::ReadOnly => write!(f, "characteristic is read-only"),
        }
    }
}

impl core::error::Error for RadioError {}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Which threshold pair an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gas {
    Co2,
    Tvoc,
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Co2 => write!(f, "CO2"),
            Self::Tvoc => write!(f, "TVOC"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `min == max` for a threshold pair, the level is undefined.
    EmptyRange(Gas),
    /// `num_levels` is zero.
    ZeroLevels,
    /// Calculation mode value outside the known set.
    UnknownMode(u8),
    /// A static configuration field failed validation.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRange(gas) => write!(f, "{gas} threshold range is empty (min == max)"),
            Self::ZeroLevels => write!(f, "number of levels is zero"),
            Self::UnknownMode(raw) => write!(f, "unknown calculation mode {raw}"),
            Self::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Target angle lies outside the mechanical limits.
    OutOfRange { target: i32, min: u8, max: u8 },
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { target, min, max } => {
                write!(f, "angle {target} outside [{min}, {max}]")
            }
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
        }
    }
}

impl core::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
