//! Unified error types for the irrigation firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through events and loop outcomes without allocation.
//!
//! None of these are fatal: the control loop maps every class to a bounded
//! wait-and-retry.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read.
    Sensor(SensorError),
    /// A pump command failed or was rejected.
    Actuator(ActuatorError),
    /// Calibration could not be finalized.
    Calibration(CalibrationError),
    /// A reading could not be mapped onto its axis.
    Mapping(MappingError),
    /// The remote decision service failed.
    Decision(DecisionError),
    /// No network path is available.
    Connectivity(ConnectivityError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Calibration(e) => write!(f, "calibration: {e}"),
            Self::Mapping(e) => write!(f, "mapping: {e}"),
            Self::Decision(e) => write!(f, "decision service: {e}"),
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Every ADC sample of a reading failed.
    AdcReadFailed,
    /// The configured GPIO has no ADC1 channel.
    NotConfigured,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::NotConfigured => write!(f, "GPIO is not an ADC1 input"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// A watering cycle is already in flight.
    Busy,
    /// GPIO set failed.
    GpioWriteFailed,
    /// The duty-cycle parameters are out of range.
    InvalidDutyCycle,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "watering cycle already active"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::InvalidDutyCycle => write!(f, "invalid duty cycle"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

/// Sensor channel a calibration error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Moisture,
    Light,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moisture => write!(f, "moisture"),
            Self::Light => write!(f, "light"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// The observed range is narrower than the configured minimum spread
    /// (negative when the channel was never sampled).
    Degenerate { channel: Channel, spread: i32 },
    /// The engine already produced its profile.
    AlreadyFinalized,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degenerate { channel, spread } if *spread < 0 => {
                write!(f, "{channel} channel has no samples")
            }
            Self::Degenerate { channel, spread } => {
                write!(f, "{channel} range too narrow (spread {spread})")
            }
            Self::AlreadyFinalized => write!(f, "calibration already finalized"),
        }
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}

// ---------------------------------------------------------------------------
// Mapping errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingError {
    /// Both axis endpoints are equal; interpolation would divide by zero.
    DegenerateAxis,
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateAxis => write!(f, "axis endpoints are equal"),
        }
    }
}

impl From<MappingError> for Error {
    fn from(e: MappingError) -> Self {
        Self::Mapping(e)
    }
}

// ---------------------------------------------------------------------------
// Decision service errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionError {
    /// Connection, TLS or I/O failure before a response arrived.
    Transport,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The service answered with a non-200 status.
    Status(u16),
    /// The body is not a valid decision document.
    Malformed,
    /// The body exceeds the response buffer.
    BodyTooLarge,
}

impl DecisionError {
    /// `true` for failures that happened before a response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport | Self::Timeout)
    }
}

impl fmt::Display for DecisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport error"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Status(code) => write!(f, "unexpected status {code}"),
            Self::Malformed => write!(f, "malformed response body"),
            Self::BodyTooLarge => write!(f, "response body too large"),
        }
    }
}

impl From<DecisionError> for Error {
    fn from(e: DecisionError) -> Self {
        Self::Decision(e)
    }
}

// ---------------------------------------------------------------------------
// Connectivity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// An override value could not be parsed; carries the key.
    InvalidOverride(&'static str),
    /// A JSON config document failed to deserialize.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::InvalidOverride(key) => write!(f, "invalid value for {key}"),
            Self::Malformed => write!(f, "malformed config document"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
