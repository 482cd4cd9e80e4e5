//! Per-channel running extremes and the frozen calibration result.

use crate::app::ports::RawReadings;
use crate::normalize::{Axis, Percent};

/// Running `{min, max}` of every raw value observed on one channel.
///
/// Direction-agnostic: which extreme means "wet" or "dark" is decided by
/// the [`Axis`] built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeTracker {
    observed_min: u16,
    observed_max: u16,
}

impl RangeTracker {
    /// Start at the inverted bounds so the first sample sets both extremes.
    pub const fn new(resolution_max: u16) -> Self {
        Self {
            observed_min: resolution_max,
            observed_max: 0,
        }
    }

    /// A tracker that has already seen `min` and `max`.
    pub fn from_bounds(min: u16, max: u16) -> Self {
        Self {
            observed_min: min.min(max),
            observed_max: min.max(max),
        }
    }

    pub fn observe(&mut self, raw: u16) {
        self.observed_min = self.observed_min.min(raw);
        self.observed_max = self.observed_max.max(raw);
    }

    pub fn observed_min(&self) -> u16 {
        self.observed_min
    }

    pub fn observed_max(&self) -> u16 {
        self.observed_max
    }

    /// `false` until at least one sample was observed.
    pub fn is_observed(&self) -> bool {
        self.observed_min <= self.observed_max
    }

    /// `max - min`; negative while nothing has been observed.
    pub fn spread(&self) -> i32 {
        i32::from(self.observed_max) - i32::from(self.observed_min)
    }
}

/// Both channels' percentages for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedReadings {
    pub moisture: Percent,
    pub light: Percent,
}

/// Frozen result of a completed calibration.  Read-only once built.
///
/// Only [`CalibrationEngine`](crate::calibration::CalibrationEngine) builds
/// one, after both channels pass the spread check:
///
/// ```compile_fail
/// use irrigator::calibration::range::{CalibrationProfile, RangeTracker};
/// let flat = RangeTracker::from_bounds(2000, 2000);
/// let _ = CalibrationProfile::new(flat, flat);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationProfile {
    moisture: RangeTracker,
    light: RangeTracker,
}

impl CalibrationProfile {
    pub(crate) fn new(moisture: RangeTracker, light: RangeTracker) -> Self {
        Self { moisture, light }
    }

    pub fn moisture_range(&self) -> &RangeTracker {
        &self.moisture
    }

    pub fn light_range(&self) -> &RangeTracker {
        &self.light
    }

    /// Inverted: lower raw ⇒ wetter ⇒ higher percent.
    pub fn moisture_axis(&self) -> Axis {
        Axis::moisture(&self.moisture)
    }

    pub fn light_axis(&self) -> Axis {
        Axis::light(&self.light)
    }

    /// Map both raw readings, falling back to 50 % on a collapsed axis.
    pub fn normalize(&self, raw: RawReadings) -> NormalizedReadings {
        NormalizedReadings {
            moisture: self.moisture_axis().map_or_fallback(raw.moisture),
            light: self.light_axis().map_or_fallback(raw.light),
        }
    }
}
