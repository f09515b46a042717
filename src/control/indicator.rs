//! Two binary indicator outputs derived from the intensity level.
//!
//! For `n = 10` the bands are:
//!
//! | level | A   | B   |
//! |-------|-----|-----|
//! | 0..4  | off | off |
//! | 4..7  | on  | off |
//! | 7..9  | on  | on  |
//! | 9..   | off | on  |

use crate::app::ports::{IndicatorOutput, IndicatorPort};

#[derive(Debug, Default)]
pub struct IndicatorController {
    last: Option<(bool, bool)>,
}

/// Compute `(A, B)` for a level.  Pure; shares no state with the controller.
pub fn bands(level: u16, num_levels: u16) -> (bool, bool) {
    let scaled = 10 * u32::from(level);
    let n = u32::from(num_levels);
    let a = 4 * n <= scaled && scaled < 9 * n;
    let b = scaled >= 7 * n;
    (a, b)
}

impl IndicatorController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write both outputs.  Writes every call, even when nothing changed.
    pub fn set_level(&mut self, level: u16, num_levels: u16, outputs: &mut impl IndicatorPort) {
        let (a, b) = bands(level, num_levels);
        outputs.digital_write(IndicatorOutput::A, a);
        outputs.digital_write(IndicatorOutput::B, b);
        self.last = Some((a, b));
    }

    /// Last pair written, `None` before the first write.
    pub fn last_written(&self) -> Option<(bool, bool)> {
        self.last
    }
}
