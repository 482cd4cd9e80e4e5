//! Main control loop: the hexagonal core.
//!
//! [`ControlLoop`] owns the frozen calibration profile and the loop
//! timing.  All I/O flows through port traits injected at call sites,
//! so a whole cycle runs on the host against mock adapters.
//!
//! ```text
//!  SensorPort ───────▶ ┌──────────────────────┐ ──▶ EventSink
//!  ConnectivityPort ─▶ │     ControlLoop      │
//!  DecisionPort ─────▶ │ read · map · decide  │ ──▶ ActuationController
//!                      └──────────────────────┘
//! ```
//!
//! One cycle ends in exactly one [`CycleBranch`], and every branch maps
//! to a wait.  No error leaves the loop.
//!
//! | Branch           | Wait                 | Pump     |
//! |------------------|----------------------|----------|
//! | `SensorFault`    | `failure_backoff_ms` | never ON |
//! | `Offline`        | `offline_backoff_ms` | never ON |
//! | `Watered`        | `recheck_ms`         | one cycle|
//! | `Idle`           | `idle_ms`            | never ON |
//! | `DecisionFailed` | `failure_backoff_ms` | never ON |
//! | `ActuatorFault`  | `failure_backoff_ms` | forced OFF |

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::calibration::range::{CalibrationProfile, NormalizedReadings};
use crate::config::{LoopTiming, SystemConfig};
use crate::control::duty_cycle::{ActuationController, DutyCycleSpec, WateringReport};
use crate::error::Error;

use super::events::AppEvent;
use super::ports::{ConnectivityPort, DecisionPort, DecisionRequest, EventSink, SensorPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleBranch {
    Offline,
    Watered,
    Idle,
    DecisionFailed,
    SensorFault,
    ActuatorFault,
}

/// What one cycle did and how long to wait before the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    pub branch: CycleBranch,
    pub wait_ms: u32,
    /// `None` when the sensors could not be read.
    pub readings: Option<NormalizedReadings>,
    pub watering: Option<WateringReport>,
}

pub struct ControlLoop<'a, P: OutputPin> {
    profile: CalibrationProfile,
    timing: LoopTiming,
    duty: DutyCycleSpec,
    actuator: &'a ActuationController<P>,
    cycles: u64,
}

impl<'a, P: OutputPin> ControlLoop<'a, P> {
    pub fn new(profile: CalibrationProfile, config: &SystemConfig, actuator: &'a ActuationController<P>) -> Self {
        Self {
            profile,
            timing: config.timing.clone(),
            duty: config.duty_cycle.clone(),
            actuator,
            cycles: 0,
        }
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    /// Cycles run since construction.
    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one cycle without the trailing wait.
    pub fn run_cycle(
        &mut self,
        sensors: &mut impl SensorPort,
        net: &mut impl ConnectivityPort,
        decider: &mut impl DecisionPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> CycleOutcome {
        self.cycles += 1;
        net.poll();

        // 1. Sensors
        let raw = match sensors.read_raw() {
            Ok(raw) => raw,
            Err(e) => {
                sink.emit(&AppEvent::Fault(Error::Sensor(e)));
                return self.outcome(CycleBranch::SensorFault, None, None);
            }
        };

        // 2. Normalize
        let normalized = self.profile.normalize(raw);
        sink.emit(&AppEvent::Readings { raw, normalized });

        // 3. Network
        if !net.is_connected() {
            sink.emit(&AppEvent::Offline);
            return self.outcome(CycleBranch::Offline, Some(normalized), None);
        }

        // 4. Decide
        let request = DecisionRequest {
            moisture: normalized.moisture,
            light: normalized.light,
        };
        let decision = match decider.decide(&request) {
            Ok(d) => d,
            Err(e) => {
                if e.is_transport() {
                    warn!("control: decision service unreachable ({})", e);
                } else {
                    warn!("control: decision service answered badly ({})", e);
                }
                sink.emit(&AppEvent::DecisionFailed(e));
                return self.outcome(CycleBranch::DecisionFailed, Some(normalized), None);
            }
        };
        let needs_watering = decision.needs_watering;
        sink.emit(&AppEvent::DecisionReceived(decision));

        if !needs_watering {
            return self.outcome(CycleBranch::Idle, Some(normalized), None);
        }

        // 5. Water
        let (on_ms, off_ms) = self.duty.split_ms();
        sink.emit(&AppEvent::WateringStarted {
            pulses: self.duty.ticks(),
            on_ms,
            off_ms,
        });
        match self.actuator.run_watering_cycle(&self.duty, delay) {
            Ok(report) => {
                sink.emit(&AppEvent::WateringFinished(report));
                self.outcome(CycleBranch::Watered, Some(normalized), Some(report))
            }
            Err(e) => {
                sink.emit(&AppEvent::Fault(Error::Actuator(e)));
                self.outcome(CycleBranch::ActuatorFault, Some(normalized), None)
            }
        }
    }

    /// Run one cycle, then block for its wait.
    pub fn step(
        &mut self,
        sensors: &mut impl SensorPort,
        net: &mut impl ConnectivityPort,
        decider: &mut impl DecisionPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> CycleOutcome {
        let outcome = self.run_cycle(sensors, net, decider, delay, sink);
        delay.delay_ms(outcome.wait_ms);
        outcome
    }

    pub fn run_forever(
        &mut self,
        sensors: &mut impl SensorPort,
        net: &mut impl ConnectivityPort,
        decider: &mut impl DecisionPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> ! {
        sink.emit(&AppEvent::Started(self.profile));
        info!("control: loop started");
        loop {
            self.step(sensors, net, decider, delay, sink);
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn outcome(
        &self,
        branch: CycleBranch,
        readings: Option<NormalizedReadings>,
        watering: Option<WateringReport>,
    ) -> CycleOutcome {
        let wait_ms = match branch {
            CycleBranch::Offline => self.timing.offline_backoff_ms,
            CycleBranch::Watered => self.timing.recheck_ms,
            CycleBranch::Idle => self.timing.idle_ms,
            CycleBranch::DecisionFailed | CycleBranch::SensorFault | CycleBranch::ActuatorFault => {
                self.timing.failure_backoff_ms
            }
        };
        CycleOutcome {
            branch,
            wait_ms,
            readings,
            watering,
        }
    }
}
