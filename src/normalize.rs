//! Raw ADC counts → 0-100 % mapping.
//!
//! Linear interpolation from a calibrated axis onto `[0, 100]`, always
//! clamped.  Argument order carries direction: `low` maps to 0 %, `high`
//! to 100 %.  Moisture probes read lower when wetter, so their axis is
//! built inverted (dry extreme first).

use core::fmt;

use log::warn;

use crate::calibration::range::RangeTracker;
use crate::error::MappingError;

/// A percentage guaranteed to lie in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percent(u8);

impl Percent {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);
    /// Returned when an axis has collapsed to a single point.
    pub const FALLBACK: Self = Self(50);

    /// Clamp an arbitrary integer into range.
    pub fn saturating(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Interpolate `raw` from `[axis_low, axis_high]` onto `[0, 100]`.
///
/// Integer arithmetic truncates toward zero, which within the domain is a
/// floor, so the result is monotonic in `raw`.  Readings outside the
/// calibrated domain (sensor drift, noise) clamp to the nearest bound.
pub fn normalize(raw: u16, axis_low: u16, axis_high: u16) -> Result<Percent, MappingError> {
    if axis_low == axis_high {
        return Err(MappingError::DegenerateAxis);
    }
    let offset = i64::from(raw) - i64::from(axis_low);
    let span = i64::from(axis_high) - i64::from(axis_low);
    Ok(Percent::saturating(offset * 100 / span))
}

/// A calibrated axis for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axis {
    /// Raw value that maps to 0 %.
    pub low: u16,
    /// Raw value that maps to 100 %.
    pub high: u16,
}

impl Axis {
    pub const fn new(low: u16, high: u16) -> Self {
        Self { low, high }
    }

    /// Inverted axis: the driest (highest) raw value is 0 % wet.
    pub fn moisture(range: &RangeTracker) -> Self {
        Self::new(range.observed_max(), range.observed_min())
    }

    /// Direct axis: the darkest (lowest) raw value is 0 % light.
    pub fn light(range: &RangeTracker) -> Self {
        Self::new(range.observed_min(), range.observed_max())
    }

    pub fn map(&self, raw: u16) -> Result<Percent, MappingError> {
        normalize(raw, self.low, self.high)
    }

    /// Like [`map`](Self::map) but resolves a degenerate axis to
    /// [`Percent::FALLBACK`].
    pub fn map_or_fallback(&self, raw: u16) -> Percent {
        match self.map(raw) {
            Ok(p) => p,
            Err(e) => {
                warn!("normalize: {} (axis {}..{}), using {}", e, self.low, self.high, Percent::FALLBACK);
                Percent::FALLBACK
            }
        }
    }
}
