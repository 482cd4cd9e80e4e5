//! Default GPIO assignments for the irrigation controller board.
//!
//! These only seed [`PinConfig::default`](crate::config::PinConfig); the
//! drivers always take their pins from the runtime configuration.

// ---------------------------------------------------------------------------
// Sensors: analog (ADC1)
// ---------------------------------------------------------------------------

/// Capacitive soil-moisture probe.  Lower reading = wetter soil.
pub const MOISTURE_ADC_GPIO: i32 = 33;
/// Photoresistor divider.  Higher reading = brighter.
pub const LIGHT_ADC_GPIO: i32 = 32;

/// 12-bit ADC full scale.
pub const ADC_RESOLUTION_MAX: u16 = 4095;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Digital output driving the pump MOSFET / relay.
pub const PUMP_SWITCH_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// User button (active-low with pull-up)
// ---------------------------------------------------------------------------

/// BOOT button; a falling edge ends field calibration.
pub const CALIBRATION_BUTTON_GPIO: i32 = 0;

/// Highest GPIO number on the classic ESP32.
pub const MAX_GPIO: i32 = 39;

/// True for a GPIO number that exists on the chip.
pub const fn is_valid_gpio(gpio: i32) -> bool {
    gpio >= 0 && gpio <= MAX_GPIO
}

/// GPIO34-39 have no output driver.
pub const fn is_input_only(gpio: i32) -> bool {
    gpio >= 34 && gpio <= MAX_GPIO
}

/// ADC1 channel for a GPIO on the classic ESP32, or `None` if the pin is
/// not routed to ADC1 (ADC2 is unusable while WiFi is active).
pub const fn adc1_channel_for_gpio(gpio: i32) -> Option<u32> {
    match gpio {
        36 => Some(0),
        37 => Some(1),
        38 => Some(2),
        39 => Some(3),
        32 => Some(4),
        33 => Some(5),
        34 => Some(6),
        35 => Some(7),
        _ => None,
    }
}
