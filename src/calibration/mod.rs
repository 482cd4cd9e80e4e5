//! Field calibration.
//!
//! The operator sweeps the probes between their extremes (dry soil → wet
//! soil, covered → lit) while [`CalibrationEngine::run`] samples both
//! channels at a fixed rate.  A button press ends the sweep; the engine
//! then validates the observed ranges and freezes them into a
//! [`CalibrationProfile`].
//!
//! ```text
//!   Calibrating ──(signal, ranges ok)──▶ Finalized
//!        ▲  │
//!        └──┘ (signal, range too narrow: trackers reset)
//! ```
//!
//! The button ISR only stores into a [`TerminationSignal`]; the engine
//! polls it once per sampling tick, so the worst-case stop latency is one
//! tick.

pub mod range;

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, SensorPort, TimePort};
use crate::config::CalibrationConfig;
use crate::error::{CalibrationError, Channel};
use range::{CalibrationProfile, RangeTracker};

// ───────────────────────────────────────────────────────────────
// Termination signal
// ───────────────────────────────────────────────────────────────

/// Edge-triggered "stop calibrating" flag.
///
/// Lock-free: [`trigger`](Self::trigger) is safe to call from interrupt
/// context.  Can live in a `static`.
#[derive(Debug, Default)]
pub struct TerminationSignal {
    pending: AtomicBool,
}

impl TerminationSignal {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Record an edge.
    pub fn trigger(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume a pending edge, if any.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Drop a stale edge.
    pub fn clear(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

// ───────────────────────────────────────────────────────────────
// Engine
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Calibrating,
    /// Terminal; no further sampling is accepted.
    Finalized,
}

pub struct CalibrationEngine<'a> {
    config: CalibrationConfig,
    resolution_max: u16,
    signal: &'a TerminationSignal,
    moisture: RangeTracker,
    light: RangeTracker,
    samples: u32,
    profile: Option<CalibrationProfile>,
}

impl<'a> CalibrationEngine<'a> {
    pub fn new(config: &CalibrationConfig, resolution_max: u16, signal: &'a TerminationSignal) -> Self {
        Self {
            config: config.clone(),
            resolution_max,
            signal,
            moisture: RangeTracker::new(resolution_max),
            light: RangeTracker::new(resolution_max),
            samples: 0,
            profile: None,
        }
    }

    pub fn state(&self) -> CalibrationState {
        if self.profile.is_some() {
            CalibrationState::Finalized
        } else {
            CalibrationState::Calibrating
        }
    }

    /// The frozen profile, once finalized.
    pub fn profile(&self) -> Option<CalibrationProfile> {
        self.profile
    }

    /// Successful samples since the last reset.
    pub fn sample_count(&self) -> u32 {
        self.samples
    }

    /// Take one sample of both channels.  A failed read is skipped.
    pub fn sample(&mut self, sensors: &mut impl SensorPort) -> Result<(), CalibrationError> {
        if self.profile.is_some() {
            return Err(CalibrationError::AlreadyFinalized);
        }
        match sensors.read_raw() {
            Ok(raw) => {
                self.moisture.observe(raw.moisture);
                self.light.observe(raw.light);
                self.samples = self.samples.saturating_add(1);
            }
            Err(e) => warn!("calibration: sample skipped ({})", e),
        }
        Ok(())
    }

    /// Validate the observed ranges and freeze them.
    ///
    /// A channel that was never sampled, or whose spread is below
    /// `min_spread`, is rejected; the trackers are reset and the engine
    /// stays in [`CalibrationState::Calibrating`].
    pub fn finalize(&mut self) -> Result<CalibrationProfile, CalibrationError> {
        if self.profile.is_some() {
            return Err(CalibrationError::AlreadyFinalized);
        }

        let min_spread = i32::from(self.config.min_spread);
        let rejected = [(Channel::Moisture, self.moisture), (Channel::Light, self.light)]
            .into_iter()
            .find(|(_, t)| !t.is_observed() || t.spread() < min_spread);

        if let Some((channel, tracker)) = rejected {
            let err = CalibrationError::Degenerate {
                channel,
                spread: tracker.spread(),
            };
            warn!("calibration rejected: {}, re-run calibration", err);
            self.reset();
            return Err(err);
        }

        let profile = CalibrationProfile::new(self.moisture, self.light);
        self.profile = Some(profile);
        info!(
            "calibration finalized after {} samples: moisture {}..{}, light {}..{}",
            self.samples,
            self.moisture.observed_min(),
            self.moisture.observed_max(),
            self.light.observed_min(),
            self.light.observed_max(),
        );
        Ok(profile)
    }

    /// Sample until the termination signal fires, then finalize.
    pub fn run(
        &mut self,
        sensors: &mut impl SensorPort,
        clock: &impl TimePort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Result<CalibrationProfile, CalibrationError> {
        if self.profile.is_some() {
            return Err(CalibrationError::AlreadyFinalized);
        }

        self.signal.clear();
        sink.emit(&AppEvent::CalibrationStarted {
            sample_rate_hz: self.config.sample_rate_hz,
        });

        let tick_ms = u64::from(self.config.tick_interval_ms());
        while !self.signal.take() {
            let started = clock.uptime_ms();
            self.sample(sensors)?;
            let elapsed = clock.uptime_ms().saturating_sub(started);
            let remaining = tick_ms.saturating_sub(elapsed);
            if remaining > 0 {
                delay.delay_ms(remaining as u32);
            }
        }

        let samples = self.samples;
        match self.finalize() {
            Ok(profile) => {
                sink.emit(&AppEvent::CalibrationFinalized { profile, samples });
                Ok(profile)
            }
            Err(e) => {
                sink.emit(&AppEvent::CalibrationRejected(e));
                Err(e)
            }
        }
    }

    /// Repeat [`run`](Self::run) until a usable profile is produced.
    pub fn run_until_accepted(
        &mut self,
        sensors: &mut impl SensorPort,
        clock: &impl TimePort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> CalibrationProfile {
        loop {
            match self.run(sensors, clock, delay, sink) {
                Ok(profile) => return profile,
                Err(CalibrationError::AlreadyFinalized) => {
                    if let Some(profile) = self.profile {
                        return profile;
                    }
                }
                Err(e) => info!("calibration: {}; sweep the probes and press the button again", e),
            }
        }
    }

    fn reset(&mut self) {
        self.moisture = RangeTracker::new(self.resolution_max);
        self.light = RangeTracker::new(self.resolution_max);
        self.samples = 0;
    }
}
