//! Pump switch driver.
//!
//! A single digital output driving the pump MOSFET or relay.  Polarity is
//! configurable because some relay boards switch on a LOW input.
//!
//! ## Safety contract
//!
//! This driver is a dumb actuator.  Timing and the guarantee that the pump
//! ends up OFF belong to
//! [`ActuationController`](crate::control::duty_cycle::ActuationController),
//! which is the only owner of a `PumpDriver` at runtime.

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Off,
    On,
}

pub struct PumpDriver<P> {
    pin: P,
    active_low: bool,
    state: PumpState,
    activations: u32,
}

impl<P: OutputPin> PumpDriver<P> {
    /// Take ownership of the pin and drive it to the OFF level.
    pub fn new(pin: P, active_low: bool) -> Result<Self, ActuatorError> {
        let mut pump = Self {
            pin,
            active_low,
            state: PumpState::Off,
            activations: 0,
        };
        pump.write(false)?;
        Ok(pump)
    }

    pub fn on(&mut self) -> Result<(), ActuatorError> {
        self.write(true)?;
        if self.state == PumpState::Off {
            self.activations = self.activations.saturating_add(1);
        }
        self.state = PumpState::On;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), ActuatorError> {
        self.write(false)?;
        self.state = PumpState::Off;
        Ok(())
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == PumpState::On
    }

    /// OFF→ON transitions since construction.
    pub fn activations(&self) -> u32 {
        self.activations
    }

    fn write(&mut self, on: bool) -> Result<(), ActuatorError> {
        let high = on != self.active_low;
        let res = if high { self.pin.set_high() } else { self.pin.set_low() };
        res.map_err(|_| {
            debug!("pump: GPIO write failed (on={})", on);
            ActuatorError::GpioWriteFailed
        })
    }
}
