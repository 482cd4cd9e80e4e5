//! System configuration parameters
//!
//! All tunable parameters for the irrigation controller.  Components take
//! the section they need at construction; nothing reads ambient constants.
//!
//! Sources are layered: [`SystemConfig::default`], then an optional JSON
//! document ([`SystemConfig::from_json`]), then `IRRIGATOR_*` key/value
//! overrides ([`SystemConfig::apply_overrides`]).  The result must pass
//! [`SystemConfig::validate`] before use.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::control::duty_cycle::DutyCycleSpec;
use crate::error::ConfigError;
use crate::pins;

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub network: NetworkConfig,
    pub decision: DecisionServiceConfig,
    pub pins: PinConfig,
    pub sensors: SensorConfig,
    pub calibration: CalibrationConfig,
    pub duty_cycle: DutyCycleSpec,
    pub timing: LoopTiming,
}

/// WiFi station credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    /// Empty for an open network.
    pub wifi_password: String,
}

/// Remote decision service endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionServiceConfig {
    /// Base URL; readings are appended as query parameters.
    pub endpoint_url: String,
    /// Upper bound for one request, connect through body read.
    pub request_timeout_ms: u32,
}

impl Default for DecisionServiceConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            request_timeout_ms: 5_000,
        }
    }
}

/// GPIO channel assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub moisture_adc_gpio: i32,
    pub light_adc_gpio: i32,
    pub pump_gpio: i32,
    pub calibration_button_gpio: i32,
    /// Drive the pump pin LOW to switch the pump on.
    pub pump_active_low: bool,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            moisture_adc_gpio: pins::MOISTURE_ADC_GPIO,
            light_adc_gpio: pins::LIGHT_ADC_GPIO,
            pump_gpio: pins::PUMP_SWITCH_GPIO,
            calibration_button_gpio: pins::CALIBRATION_BUTTON_GPIO,
            pump_active_low: false,
        }
    }
}

/// Analog front-end parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Largest raw value the ADC can produce.
    pub resolution_max: u16,
    /// ADC samples averaged into one reading.
    pub samples_per_reading: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            resolution_max: pins::ADC_RESOLUTION_MAX,
            samples_per_reading: 4,
        }
    }
}

/// Field-calibration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Sampling rate while calibrating.
    pub sample_rate_hz: u32,
    /// Narrowest accepted `max - min` per channel, in raw counts.
    /// `0` only rejects channels that were never sampled.
    pub min_spread: u16,
}

impl CalibrationConfig {
    /// Length of one sampling tick.
    pub fn tick_interval_ms(&self) -> u32 {
        1000 / self.sample_rate_hz.max(1)
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 10,
            min_spread: 200,
        }
    }
}

/// Waits between control-loop cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopTiming {
    /// No network: retry soon.
    pub offline_backoff_ms: u32,
    /// After watering: re-check soon.
    pub recheck_ms: u32,
    /// Service said no watering needed.
    pub idle_ms: u32,
    /// Decision, sensor or actuator failure.
    pub failure_backoff_ms: u32,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            offline_backoff_ms: 1_000,
            recheck_ms: 3_000,
            idle_ms: 60_000,
            failure_backoff_ms: 10_000,
        }
    }
}

impl SystemConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep their
    /// defaults.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(doc).map_err(|e| {
            log::warn!("config JSON rejected: {}", e);
            ConfigError::Malformed
        })
    }

    /// Apply `IRRIGATOR_*` overrides.  `lookup` returns the raw value for a
    /// key, or `None` to leave the field untouched.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("IRRIGATOR_WIFI_SSID") {
            self.network.wifi_ssid = v;
        }
        if let Some(v) = lookup("IRRIGATOR_WIFI_PASSWORD") {
            self.network.wifi_password = v;
        }
        if let Some(v) = lookup("IRRIGATOR_DECISION_URL") {
            self.decision.endpoint_url = v;
        }

        override_parsed(&lookup, "IRRIGATOR_DECISION_TIMEOUT_MS", &mut self.decision.request_timeout_ms)?;
        override_parsed(&lookup, "IRRIGATOR_MOISTURE_GPIO", &mut self.pins.moisture_adc_gpio)?;
        override_parsed(&lookup, "IRRIGATOR_LIGHT_GPIO", &mut self.pins.light_adc_gpio)?;
        override_parsed(&lookup, "IRRIGATOR_PUMP_GPIO", &mut self.pins.pump_gpio)?;
        override_parsed(&lookup, "IRRIGATOR_BUTTON_GPIO", &mut self.pins.calibration_button_gpio)?;
        override_flag(&lookup, "IRRIGATOR_PUMP_ACTIVE_LOW", &mut self.pins.pump_active_low)?;
        override_parsed(&lookup, "IRRIGATOR_SAMPLE_RATE_HZ", &mut self.calibration.sample_rate_hz)?;
        override_parsed(&lookup, "IRRIGATOR_MIN_SPREAD", &mut self.calibration.min_spread)?;
        override_parsed(&lookup, "IRRIGATOR_PUMP_PERIOD_MS", &mut self.duty_cycle.period_ms)?;
        override_parsed(&lookup, "IRRIGATOR_PUMP_DUTY", &mut self.duty_cycle.duty_fraction)?;
        override_parsed(&lookup, "IRRIGATOR_PUMP_DURATION_S", &mut self.duty_cycle.total_duration_s)?;
        override_parsed(&lookup, "IRRIGATOR_OFFLINE_BACKOFF_MS", &mut self.timing.offline_backoff_ms)?;
        override_parsed(&lookup, "IRRIGATOR_RECHECK_MS", &mut self.timing.recheck_ms)?;
        override_parsed(&lookup, "IRRIGATOR_IDLE_MS", &mut self.timing.idle_ms)?;
        override_parsed(&lookup, "IRRIGATOR_FAILURE_BACKOFF_MS", &mut self.timing.failure_backoff_ms)?;
        Ok(())
    }

    /// Reject values that would make a component misbehave.  Out-of-range
    /// values are reported, never silently clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ssid_len = self.network.wifi_ssid.len();
        if ssid_len > 32 {
            return Err(ConfigError::ValidationFailed("wifi_ssid longer than 32 bytes"));
        }
        let pass_len = self.network.wifi_password.len();
        if pass_len != 0 && !(8..=64).contains(&pass_len) {
            return Err(ConfigError::ValidationFailed("wifi_password must be 8-64 bytes or empty"));
        }

        let url = self.decision.endpoint_url.as_str();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationFailed("endpoint_url must be http:// or https://"));
        }
        if self.decision.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("request_timeout_ms must be > 0"));
        }

        if self.pins.moisture_adc_gpio == self.pins.light_adc_gpio {
            return Err(ConfigError::ValidationFailed("moisture and light share an ADC pin"));
        }
        if pins::adc1_channel_for_gpio(self.pins.moisture_adc_gpio).is_none() {
            return Err(ConfigError::ValidationFailed("moisture_adc_gpio is not an ADC1 pin"));
        }
        if pins::adc1_channel_for_gpio(self.pins.light_adc_gpio).is_none() {
            return Err(ConfigError::ValidationFailed("light_adc_gpio is not an ADC1 pin"));
        }
        if !pins::is_valid_gpio(self.pins.pump_gpio) {
            return Err(ConfigError::ValidationFailed("pump_gpio out of range 0-39"));
        }
        if pins::is_input_only(self.pins.pump_gpio) {
            return Err(ConfigError::ValidationFailed("pump_gpio is an input-only pin"));
        }
        if !pins::is_valid_gpio(self.pins.calibration_button_gpio) {
            return Err(ConfigError::ValidationFailed("calibration_button_gpio out of range 0-39"));
        }
        let assigned = [
            self.pins.moisture_adc_gpio,
            self.pins.light_adc_gpio,
            self.pins.pump_gpio,
            self.pins.calibration_button_gpio,
        ];
        for (i, gpio) in assigned.iter().enumerate() {
            if assigned[i + 1..].contains(gpio) {
                return Err(ConfigError::ValidationFailed("two pin roles share a GPIO"));
            }
        }

        if self.sensors.resolution_max == 0 {
            return Err(ConfigError::ValidationFailed("resolution_max must be > 0"));
        }
        if self.sensors.samples_per_reading == 0 {
            return Err(ConfigError::ValidationFailed("samples_per_reading must be > 0"));
        }

        if !(1..=1000).contains(&self.calibration.sample_rate_hz) {
            return Err(ConfigError::ValidationFailed("sample_rate_hz must be 1-1000"));
        }

        self.duty_cycle.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Build-time configuration
// ---------------------------------------------------------------------------

impl SystemConfig {
    /// Configuration baked into the firmware image: the JSON document in
    /// `IRRIGATOR_CONFIG_JSON` (if any), then the individual
    /// `IRRIGATOR_*` variables, all captured at compile time.
    pub fn load_baked() -> Result<Self, ConfigError> {
        let mut config = match option_env!("IRRIGATOR_CONFIG_JSON") {
            Some(doc) => Self::from_json(doc)?,
            None => Self::default(),
        };
        config.apply_overrides(baked_override)?;
        config.validate()?;
        Ok(config)
    }
}

/// Compile-time value of an override key.
pub fn baked_override(key: &str) -> Option<String> {
    let value = match key {
        "IRRIGATOR_WIFI_SSID" => option_env!("IRRIGATOR_WIFI_SSID"),
        "IRRIGATOR_WIFI_PASSWORD" => option_env!("IRRIGATOR_WIFI_PASSWORD"),
        "IRRIGATOR_DECISION_URL" => option_env!("IRRIGATOR_DECISION_URL"),
        "IRRIGATOR_DECISION_TIMEOUT_MS" => option_env!("IRRIGATOR_DECISION_TIMEOUT_MS"),
        "IRRIGATOR_MOISTURE_GPIO" => option_env!("IRRIGATOR_MOISTURE_GPIO"),
        "IRRIGATOR_LIGHT_GPIO" => option_env!("IRRIGATOR_LIGHT_GPIO"),
        "IRRIGATOR_PUMP_GPIO" => option_env!("IRRIGATOR_PUMP_GPIO"),
        "IRRIGATOR_BUTTON_GPIO" => option_env!("IRRIGATOR_BUTTON_GPIO"),
        "IRRIGATOR_PUMP_ACTIVE_LOW" => option_env!("IRRIGATOR_PUMP_ACTIVE_LOW"),
        "IRRIGATOR_SAMPLE_RATE_HZ" => option_env!("IRRIGATOR_SAMPLE_RATE_HZ"),
        "IRRIGATOR_MIN_SPREAD" => option_env!("IRRIGATOR_MIN_SPREAD"),
        "IRRIGATOR_PUMP_PERIOD_MS" => option_env!("IRRIGATOR_PUMP_PERIOD_MS"),
        "IRRIGATOR_PUMP_DUTY" => option_env!("IRRIGATOR_PUMP_DUTY"),
        "IRRIGATOR_PUMP_DURATION_S" => option_env!("IRRIGATOR_PUMP_DURATION_S"),
        "IRRIGATOR_OFFLINE_BACKOFF_MS" => option_env!("IRRIGATOR_OFFLINE_BACKOFF_MS"),
        "IRRIGATOR_RECHECK_MS" => option_env!("IRRIGATOR_RECHECK_MS"),
        "IRRIGATOR_IDLE_MS" => option_env!("IRRIGATOR_IDLE_MS"),
        "IRRIGATOR_FAILURE_BACKOFF_MS" => option_env!("IRRIGATOR_FAILURE_BACKOFF_MS"),
        _ => None,
    };
    value.map(str::to_owned)
}

fn override_parsed<F, T>(lookup: &F, key: &'static str, field: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *field = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidOverride(key))?;
    }
    Ok(())
}

fn override_flag<F>(lookup: &F, key: &'static str, field: &mut bool) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        *field = match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => return Err(ConfigError::InvalidOverride(key)),
        };
    }
    Ok(())
}
