//! Analog sensor front-end: the [`SensorHub`] behind [`SensorPort`].
//!
//! Both probes sit on ADC1 (ADC2 is unusable while WiFi is up).  Every
//! reading averages `samples_per_reading` conversions per channel to
//! smooth capacitive-probe noise; failed conversions are dropped from the
//! average, and a reading fails only when every conversion of a channel
//! failed.
//!
//! ## Dual-target design
//!
//! The hub reads through a plain `fn(channel) -> Option<u16>`, which is
//! [`hw_init::adc1_read`] in firmware (oneshot API on ESP-IDF, injected
//! atomics on host).  Tests pass their own reader.

use log::debug;

use crate::app::ports::{RawReadings, SensorPort};
use crate::config::{PinConfig, SensorConfig};
use crate::drivers::hw_init;
use crate::error::SensorError;
use crate::pins::adc1_channel_for_gpio;

/// Single-conversion ADC reader.
pub type AdcReader = fn(u32) -> Option<u16>;

pub struct SensorHub {
    moisture_channel: u32,
    light_channel: u32,
    resolution_max: u16,
    samples: u8,
    read: AdcReader,
}

impl SensorHub {
    /// Hub over the ADC1 channels of the configured GPIOs.
    pub fn new(pins: &PinConfig, sensors: &SensorConfig) -> Result<Self, SensorError> {
        Self::with_reader(pins, sensors, hw_init::adc1_read)
    }

    pub fn with_reader(pins: &PinConfig, sensors: &SensorConfig, read: AdcReader) -> Result<Self, SensorError> {
        let moisture_channel = adc1_channel_for_gpio(pins.moisture_adc_gpio).ok_or(SensorError::NotConfigured)?;
        let light_channel = adc1_channel_for_gpio(pins.light_adc_gpio).ok_or(SensorError::NotConfigured)?;
        Ok(Self {
            moisture_channel,
            light_channel,
            resolution_max: sensors.resolution_max,
            samples: sensors.samples_per_reading.max(1),
            read,
        })
    }

    fn read_channel(&self, channel: u32) -> Result<u16, SensorError> {
        let mut sum: u32 = 0;
        let mut ok: u32 = 0;
        for _ in 0..self.samples {
            match (self.read)(channel) {
                Some(raw) => {
                    sum += u32::from(raw);
                    ok += 1;
                }
                None => debug!("sensors: conversion failed on ADC1 CH{}", channel),
            }
        }
        if ok == 0 {
            return Err(SensorError::AdcReadFailed);
        }
        let avg = sum / ok;
        Ok(avg.min(u32::from(self.resolution_max)) as u16)
    }
}

impl SensorPort for SensorHub {
    fn read_raw(&mut self) -> Result<RawReadings, SensorError> {
        Ok(RawReadings {
            moisture: self.read_channel(self.moisture_channel)?,
            light: self.read_channel(self.light_channel)?,
        })
    }
}
