//! Irrigator Firmware: Main Entry Point
//!
//! Boot wiring only; all behaviour lives in the library.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SensorHub       WifiAdapter        HttpDecisionClient         │
//! │  (SensorPort)    (Connectivity)     (DecisionPort)             │
//! │  LogEventSink    Esp32TimeAdapter   BlockingDelay              │
//! │  (EventSink)     (TimePort)         (DelayNs)                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  CalibrationEngine ─▶ CalibrationProfile ─▶ ControlLoop │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ActuationController ── PumpDriver<GpioOutput>                 │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use embedded_hal::delay::DelayNs;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use irrigator::adapters::http_decision::HttpDecisionClient;
use irrigator::adapters::log_sink::LogEventSink;
use irrigator::adapters::time::{BlockingDelay, Esp32TimeAdapter};
use irrigator::adapters::wifi::WifiAdapter;
use irrigator::app::service::ControlLoop;
use irrigator::calibration::CalibrationEngine;
use irrigator::config::SystemConfig;
use irrigator::control::duty_cycle::ActuationController;
use irrigator::drivers::button::{CALIBRATION_DONE, CalibrationButton};
use irrigator::drivers::hw_init::{self, GpioInput, GpioOutput};
use irrigator::drivers::pump::PumpDriver;
use irrigator::error::Error;
use irrigator::sensors::SensorHub;

const WIFI_BOOT_ATTEMPTS: u32 = 20;
const WIFI_BOOT_PAUSE_MS: u32 = 500;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Irrigator v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = match SystemConfig::load_baked() {
        Ok(c) => c,
        Err(e) => {
            warn!("baked config rejected ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Hardware ───────────────────────────────────────────
    let pins = &config.pins;
    hw_init::init_adc(&[pins.moisture_adc_gpio, pins.light_adc_gpio])?;
    let mut sensors = SensorHub::new(pins, &config.sensors).map_err(Error::from)?;

    let pump = PumpDriver::new(GpioOutput::new(pins.pump_gpio)?, pins.pump_active_low).map_err(Error::from)?;
    let actuator = ActuationController::new(pump);

    let mut button = CalibrationButton::new(GpioInput::new(pins.calibration_button_gpio)?);
    hw_init::init_button_isr(pins.calibration_button_gpio)?;

    let clock = Esp32TimeAdapter::new();
    let mut delay = BlockingDelay;
    let mut sink = LogEventSink::new();

    // ── 4. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sysloop)?);

    match wifi.set_credentials(&config.network.wifi_ssid, &config.network.wifi_password) {
        Ok(()) => {
            if let Err(e) = wifi.connect_with_retries(WIFI_BOOT_ATTEMPTS, WIFI_BOOT_PAUSE_MS, &mut delay) {
                warn!("WiFi: {} after {} attempts, will keep retrying", e, WIFI_BOOT_ATTEMPTS);
            }
        }
        Err(e) => warn!("WiFi: {}, running offline", e),
    }

    // ── 5. Calibration ────────────────────────────────────────
    if button.is_pressed() {
        warn!("calibration button held at boot, release it to start");
        while button.is_pressed() {
            delay.delay_ms(10);
        }
    }
    let mut engine = CalibrationEngine::new(&config.calibration, config.sensors.resolution_max, &CALIBRATION_DONE);
    let profile = engine.run_until_accepted(&mut sensors, &clock, &mut delay, &mut sink);

    // ── 6. Control loop ───────────────────────────────────────
    let mut decider = HttpDecisionClient::new(&config.decision);
    let mut control = ControlLoop::new(profile, &config, &actuator);
    control.run_forever(&mut sensors, &mut wifi, &mut decider, &mut delay, &mut sink)
}
