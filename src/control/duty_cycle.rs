//! Duty-cycled pump actuation.
//!
//! Instead of running the pump continuously, a watering cycle switches it
//! ON for a fraction of every fixed period.  This limits average flow and
//! power draw.
//!
//! ```text
//!   ┌──┐    ┌──┐    ┌──┐
//!   │on│off │on│off │on│off      ticks = total_duration_s * 1000 / period_ms
//! ──┘  └────┘  └────┘  └────
//!   |<-period->|
//! ```
//!
//! [`ActuationController`] is the sole owner of the pump.  It serialises
//! access with a mutex (a second caller is rejected, never interleaved)
//! and wraps every cycle in a [`PumpActivation`] guard whose `Drop`
//! switches the pump OFF on every exit path.

use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::drivers::pump::{PumpDriver, PumpState};
use crate::error::{ActuatorError, ConfigError};

// ───────────────────────────────────────────────────────────────
// Duty-cycle parameters
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DutyCycleSpec {
    /// Length of one ON+OFF period.
    pub period_ms: u32,
    /// Share of each period the pump is ON, exclusive of 0 and 1.
    pub duty_fraction: f32,
    /// Total length of one watering cycle.
    pub total_duration_s: u32,
}

impl Default for DutyCycleSpec {
    fn default() -> Self {
        Self {
            period_ms: 1_000,
            duty_fraction: 0.2,
            total_duration_s: 5,
        }
    }
}

impl DutyCycleSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::ValidationFailed("period_ms must be > 0"));
        }
        if !(self.duty_fraction > 0.0 && self.duty_fraction < 1.0) {
            return Err(ConfigError::ValidationFailed("duty_fraction must be in (0, 1)"));
        }
        // Rounding can still collapse a short period to all-ON or all-OFF.
        let (on_ms, off_ms) = self.split_ms();
        if on_ms == 0 || off_ms == 0 {
            return Err(ConfigError::ValidationFailed("duty cycle rounds to always-on or always-off"));
        }
        Ok(())
    }

    /// Whole periods in one cycle.
    ///
    /// Integer division: a trailing partial period is dropped, so a 2.5 s
    /// cycle with a 1 s period runs 2 periods.
    pub fn ticks(&self) -> u32 {
        let total_ms = u64::from(self.total_duration_s) * 1000;
        (total_ms / u64::from(self.period_ms.max(1))).min(u64::from(u32::MAX)) as u32
    }

    /// `(on_ms, off_ms)` for one period; `on_ms` is rounded to the nearest
    /// millisecond.
    pub fn split_ms(&self) -> (u32, u32) {
        let on = (f64::from(self.period_ms) * f64::from(self.duty_fraction)).round() as u32;
        let on = on.min(self.period_ms);
        (on, self.period_ms - on)
    }
}

// ───────────────────────────────────────────────────────────────
// Cycle result
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WateringReport {
    /// Completed ON/OFF pairs.
    pub pulses: u32,
    pub on_ms: u32,
    pub off_ms: u32,
    /// Ended early by [`ActuationController::request_stop`].
    pub aborted: bool,
}

// ───────────────────────────────────────────────────────────────
// Scoped pump ownership
// ───────────────────────────────────────────────────────────────

/// Exclusive access to the pump for the length of one cycle.  Dropping it
/// drives the pump OFF.
pub struct PumpActivation<'a, P: OutputPin> {
    pump: MutexGuard<'a, PumpDriver<P>>,
}

impl<P: OutputPin> Deref for PumpActivation<'_, P> {
    type Target = PumpDriver<P>;

    fn deref(&self) -> &Self::Target {
        &self.pump
    }
}

impl<P: OutputPin> DerefMut for PumpActivation<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pump
    }
}

impl<P: OutputPin> Drop for PumpActivation<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.pump.off() {
            error!("pump: release could not switch OFF: {}", e);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct ActuationController<P> {
    pump: Mutex<PumpDriver<P>>,
    stop_requested: AtomicBool,
}

impl<P: OutputPin> ActuationController<P> {
    pub fn new(pump: PumpDriver<P>) -> Self {
        Self {
            pump: Mutex::new(pump),
            stop_requested: AtomicBool::new(false),
        }
    }

    /// Acquire the pump, or [`ActuatorError::Busy`] if a cycle holds it.
    pub fn acquire(&self) -> Result<PumpActivation<'_, P>, ActuatorError> {
        let pump = match self.pump.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(ActuatorError::Busy),
            Err(TryLockError::Poisoned(poisoned)) => {
                // The previous holder's guard already ran its OFF path.
                warn!("pump: recovering lock after an aborted cycle");
                poisoned.into_inner()
            }
        };
        Ok(PumpActivation { pump })
    }

    /// `true` while a watering cycle holds the pump.
    pub fn is_active(&self) -> bool {
        matches!(self.pump.try_lock(), Err(TryLockError::WouldBlock))
    }

    /// Current pump state, or `None` while a cycle holds the pump.
    pub fn pump_state(&self) -> Option<PumpState> {
        match self.pump.try_lock() {
            Ok(pump) => Some(pump.state()),
            Err(TryLockError::Poisoned(p)) => Some(p.into_inner().state()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Ask the running (or next) cycle to stop before its next period.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Run one duty-cycled watering cycle, blocking on `delay`.
    pub fn run_watering_cycle(
        &self,
        spec: &DutyCycleSpec,
        delay: &mut impl DelayNs,
    ) -> Result<WateringReport, ActuatorError> {
        if spec.validate().is_err() {
            return Err(ActuatorError::InvalidDutyCycle);
        }
        let mut pump = self.acquire()?;

        let (on_ms, off_ms) = spec.split_ms();
        let ticks = spec.ticks();
        let mut report = WateringReport {
            pulses: 0,
            on_ms,
            off_ms,
            aborted: false,
        };
        info!("pump: {} x ({}ms on / {}ms off)", ticks, on_ms, off_ms);

        for _ in 0..ticks {
            if self.stop_requested.swap(false, Ordering::AcqRel) {
                report.aborted = true;
                break;
            }
            pump.on()?;
            delay.delay_ms(on_ms);
            pump.off()?;
            report.pulses += 1;
            if off_ms > 0 {
                delay.delay_ms(off_ms);
            }
        }
        self.stop_requested.store(false, Ordering::Release);
        drop(pump);

        if report.aborted {
            warn!("pump: cycle stopped after {} of {} pulses", report.pulses, ticks);
        }
        Ok(report)
    }
}
