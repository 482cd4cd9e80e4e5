//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop / CalibrationEngine (domain)
//! ```
//!
//! Driven adapters (sensors, network, decision service, event sinks)
//! implement these traits.  The domain consumes them via call-site
//! generics, so the core never touches hardware directly.  The pump is
//! not a port: it is an `embedded_hal` [`OutputPin`] owned by the
//! [`ActuationController`](crate::control::duty_cycle::ActuationController).
//!
//! [`OutputPin`]: embedded_hal::digital::OutputPin

use crate::error::{ConnectivityError, DecisionError, SensorError};
use crate::normalize::Percent;

use super::decision::WateringDecision;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One raw sample of both analog channels, in ADC counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReadings {
    pub moisture: u16,
    pub light: u16,
}

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Read both channels.  Values are already clamped to the sensor
    /// resolution.
    fn read_raw(&mut self) -> Result<RawReadings, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic clock.  Blocking waits go through `embedded_hal`'s
/// `DelayNs` instead.
pub trait TimePort {
    fn uptime_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port
// ───────────────────────────────────────────────────────────────

/// Network link as seen by the control loop.
pub trait ConnectivityPort {
    /// Establish the link with the stored credentials.
    fn connect(&mut self) -> Result<(), ConnectivityError>;

    /// Drive reconnection.  Called once at the top of every cycle.
    fn poll(&mut self);

    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Decision port
// ───────────────────────────────────────────────────────────────

/// Query parameters sent to the decision service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionRequest {
    pub moisture: Percent,
    pub light: Percent,
}

/// Remote "should I water?" oracle.
///
/// Implementations MUST bound the call with a timeout and report it as
/// [`DecisionError::Timeout`], distinct from other transport failures.
pub trait DecisionPort {
    fn decide(&mut self, request: &DecisionRequest) -> Result<WateringDecision, DecisionError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
