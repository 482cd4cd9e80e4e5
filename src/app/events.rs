//! Outbound application events.
//!
//! The calibration engine and the [`ControlLoop`](super::service::ControlLoop)
//! emit these through the [`EventSink`](super::ports::EventSink) port.

use crate::calibration::range::{CalibrationProfile, NormalizedReadings};
use crate::control::duty_cycle::WateringReport;
use crate::error::{CalibrationError, DecisionError, Error};

use super::decision::WateringDecision;
use super::ports::RawReadings;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A calibration sweep began.
    CalibrationStarted { sample_rate_hz: u32 },

    /// The sweep produced a usable profile.
    CalibrationFinalized { profile: CalibrationProfile, samples: u32 },

    /// The sweep was rejected; sampling restarts.
    CalibrationRejected(CalibrationError),

    /// The control loop is about to run its first cycle.
    Started(CalibrationProfile),

    /// Raw and normalized readings of one cycle.
    Readings { raw: RawReadings, normalized: NormalizedReadings },

    /// No network; the decision call was skipped.
    Offline,

    DecisionReceived(WateringDecision),

    DecisionFailed(DecisionError),

    WateringStarted { pulses: u32, on_ms: u32, off_ms: u32 },

    WateringFinished(WateringReport),

    /// A sensor or actuator failure ended the cycle early.
    Fault(Error),
}
