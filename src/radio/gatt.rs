//! GATT layout and value codec.
//!
//! ## Local control points
//!
//! All UUIDs share the form `c55e4011-c55e-4011-00SS-c55e401100CC`.
//!
//! | Service (SS)          | Characteristic (CC)   | Width |
//! |-----------------------|-----------------------|-------|
//! | 01 thresholds         | 01 min_co2            | u16   |
//! |                       | 02 max_co2            | u16   |
//! |                       | 03 min_tvoc           | u16   |
//! |                       | 04 max_tvoc           | u16   |
//! |                       | 05 num_levels         | u8    |
//! |                       | 06 mode               | u8    |
//! | 02 flower air quality | 01 current_co2        | u16   |
//! |                       | 02 current_tvoc       | u16   |
//! |                       | 03 current_level      | u16   |
//!
//! ## Remote sensor
//!
//! Service `c55e4011-c55e-4011-0000-c55e40110001`, CO2 at `…0002`,
//! TVOC at `…0003`, both u16.
//!
//! Every value is little-endian.

use crate::error::RadioError;

const UUID_BASE: u128 = 0xc55e4011_c55e_4011_0000_c55e40110000;

/// Build a UUID in the shared base from service and characteristic bytes.
pub const fn uuid(service: u8, characteristic: u8) -> u128 {
    UUID_BASE | ((service as u128) << 48) | characteristic as u128
}

pub const THRESHOLD_SERVICE_UUID: u128 = uuid(0x01, 0x00);
pub const FLOWER_SERVICE_UUID: u128 = uuid(0x02, 0x00);

pub const SENSOR_SERVICE_UUID: u128 = uuid(0x00, 0x01);
pub const SENSOR_CO2_UUID: u128 = uuid(0x00, 0x02);
pub const SENSOR_TVOC_UUID: u128 = uuid(0x00, 0x03);

/// One characteristic in the device's own GATT table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlPoint {
    MinCo2,
    MaxCo2,
    MinTvoc,
    MaxTvoc,
    NumLevels,
    Mode,
    CurrentCo2,
    CurrentTvoc,
    CurrentLevel,
}

impl ControlPoint {
    pub const ALL: [Self; 9] = [
        Self::MinCo2,
        Self::MaxCo2,
        Self::MinTvoc,
        Self::MaxTvoc,
        Self::NumLevels,
        Self::Mode,
        Self::CurrentCo2,
        Self::CurrentTvoc,
        Self::CurrentLevel,
    ];

    pub const fn uuid(self) -> u128 {
        match self {
            Self::MinCo2 => uuid(0x01, 0x01),
            Self::MaxCo2 => uuid(0x01, 0x02),
            Self::MinTvoc => uuid(0x01, 0x03),
            Self::MaxTvoc => uuid(0x01, 0x04),
            Self::NumLevels => uuid(0x01, 0x05),
            Self::Mode => uuid(0x01, 0x06),
            Self::CurrentCo2 => uuid(0x02, 0x01),
            Self::CurrentTvoc => uuid(0x02, 0x02),
            Self::CurrentLevel => uuid(0x02, 0x03),
        }
    }

    pub const fn service_uuid(self) -> u128 {
        match self {
            Self::MinCo2
            | Self::MaxCo2
            | Self::MinTvoc
            | Self::MaxTvoc
            | Self::NumLevels
            | Self::Mode => THRESHOLD_SERVICE_UUID,
            Self::CurrentCo2 | Self::CurrentTvoc | Self::CurrentLevel => FLOWER_SERVICE_UUID,
        }
    }

    /// Stored width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::NumLevels | Self::Mode => 1,
            _ => 2,
        }
    }

    /// Live measurements are set by the device only.
    pub const fn client_writable(self) -> bool {
        !matches!(self, Self::CurrentCo2 | Self::CurrentTvoc)
    }

    pub fn from_uuid(uuid: u128) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.uuid() == uuid)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::MinCo2 => "min_co2",
            Self::MaxCo2 => "max_co2",
            Self::MinTvoc => "min_tvoc",
            Self::MaxTvoc => "max_tvoc",
            Self::NumLevels => "num_levels",
            Self::Mode => "mode",
            Self::CurrentCo2 => "current_co2",
            Self::CurrentTvoc => "current_tvoc",
            Self::CurrentLevel => "current_level",
        }
    }
}

/// Encode `value` at the point's width.  Values wider than a u8 point
/// saturate at 255.
pub fn encode(point: ControlPoint, value: u16) -> heapless::Vec<u8, 2> {
    let mut out = heapless::Vec::new();
    if point.width() == 1 {
        let _ = out.push(value.min(u16::from(u8::MAX)) as u8);
    } else {
        let _ = out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Decode a stored or client-written value.  The length must match the
/// point's width exactly.
pub fn decode(point: ControlPoint, bytes: &[u8]) -> Result<u16, RadioError> {
    match (point.width(), bytes) {
        (1, [b]) => Ok(u16::from(*b)),
        (2, _) => decode_u16_le(bytes),
        _ => Err(RadioError::MalformedValue),
    }
}

/// Decode a 2-byte little-endian value read from the remote sensor.
pub fn decode_u16_le(bytes: &[u8]) -> Result<u16, RadioError> {
    match bytes {
        [lo, hi] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(RadioError::MalformedValue),
    }
}
