//! Intensity mapping — raw gas concentration → bounded discrete level.
//!
//! Pure functions, no state beyond the thresholds handed in.
//!
//! ```text
//!   level
//!     n ┤                    ┌──────────
//!       │                 ┌──┘
//!       │              ┌──┘
//!       │           ┌──┘
//!     0 ┼───────────┘
//!       └───────────┬────────┬──────────▶ value
//!                  min      max
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Gas};

/// Live thresholds, written only by the threshold-sync task.
///
/// `min < max` is expected but not enforced on write; a degenerate
/// range surfaces as [`ConfigError::EmptyRange`] when a level is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub co2_min: u16,
    pub co2_max: u16,
    pub tvoc_min: u16,
    pub tvoc_max: u16,
    pub num_levels: u16,
    /// Raw mode as written to the control point.
    pub mode: u8,
}

/// How the CO2 and TVOC levels are combined into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CalculationMode {
    /// Worst of the two.
    Max = 0,
    /// Floor of the mean.
    Average = 1,
    /// Sum, clamped to the level range.
    Sum = 2,
    /// Keep the previous level (manual control).
    Hold = 3,
}

impl TryFrom<u8> for CalculationMode {
    type Error = ConfigError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Max),
            1 => Ok(Self::Average),
            2 => Ok(Self::Sum),
            3 => Ok(Self::Hold),
            other => Err(ConfigError::UnknownMode(other)),
        }
    }
}

/// Map a concentration onto `[0, num_levels]`.
///
/// Below `min` is 0, above `max` is `num_levels`; in between the range is
/// split into `num_levels` equal bands.  Only `value == min == max` can
/// reach the division, which is reported instead of divided by zero.
pub fn level_for(value: u16, min: u16, max: u16, num_levels: u16, gas: Gas) -> Result<u16, ConfigError> {
    if value < min {
        return Ok(0);
    }
    if value > max {
        return Ok(num_levels);
    }
    if max == min {
        return Err(ConfigError::EmptyRange(gas));
    }
    let span = u32::from(max - min);
    let offset = u32::from(value - min);
    Ok((u32::from(num_levels) * offset / span) as u16)
}

/// Combine the per-gas levels.  Returns `None` for [`CalculationMode::Hold`],
/// in which case the caller keeps its previous level.
pub fn combine_levels(co2_level: u16, tvoc_level: u16, mode: CalculationMode, num_levels: u16) -> Option<u16> {
    let combined = match mode {
        CalculationMode::Max => co2_level.max(tvoc_level),
        CalculationMode::Average => ((u32::from(co2_level) + u32::from(tvoc_level)) / 2) as u16,
        CalculationMode::Sum => co2_level.saturating_add(tvoc_level),
        CalculationMode::Hold => return None,
    };
    Some(combined.min(num_levels))
}

impl Thresholds {
    /// CO2 level for the given reading.
    pub fn co2_level(&self, co2_ppm: u16) -> Result<u16, ConfigError> {
        level_for(co2_ppm, self.co2_min, self.co2_max, self.num_levels, Gas::Co2)
    }

    /// TVOC level for the given reading.
    pub fn tvoc_level(&self, tvoc_ppb: u16) -> Result<u16, ConfigError> {
        level_for(tvoc_ppb, self.tvoc_min, self.tvoc_max, self.num_levels, Gas::Tvoc)
    }

    /// Parsed calculation mode.
    pub fn calculation_mode(&self) -> Result<CalculationMode, ConfigError> {
        CalculationMode::try_from(self.mode)
    }
}
