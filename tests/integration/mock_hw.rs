//! Mock adapters for integration tests.
//!
//! A shared [`Timeline`] gives the pump pin, the delay and the clock one
//! virtual time axis, so tests can assert on exact ON/OFF edges without
//! sleeping.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use irrigator::app::decision::{WateringDecision, parse_decision_response};
use irrigator::app::events::AppEvent;
use irrigator::app::ports::{
    ConnectivityPort, DecisionPort, DecisionRequest, EventSink, RawReadings, SensorPort, TimePort,
};
use irrigator::calibration::TerminationSignal;
use irrigator::error::{ConnectivityError, DecisionError, SensorError};

// ── Virtual time ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Timeline {
    pub now_ms: u64,
    /// `(time, high)` for every pin write.
    pub edges: Vec<(u64, bool)>,
    /// Every delay, in order.
    pub sleeps: Vec<u32>,
}

pub type SharedTimeline = Rc<RefCell<Timeline>>;

pub fn timeline() -> SharedTimeline {
    Rc::new(RefCell::new(Timeline::default()))
}

pub struct VirtualDelay(pub SharedTimeline);

impl DelayNs for VirtualDelay {
    fn delay_ns(&mut self, ns: u32) {
        let mut t = self.0.borrow_mut();
        t.now_ms += u64::from(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut t = self.0.borrow_mut();
        t.now_ms += u64::from(ms);
        t.sleeps.push(ms);
    }
}

pub struct VirtualClock(pub SharedTimeline);

impl TimePort for VirtualClock {
    fn uptime_ms(&self) -> u64 {
        self.0.borrow().now_ms
    }
}

// ── Pump pin ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Output pin that logs each write on the timeline.
pub struct RecordingPin {
    timeline: SharedTimeline,
    /// Fail the n-th `set_low` (0-based), once.
    fail_low_at: Option<usize>,
    lows: usize,
}

#[allow(dead_code)]
impl RecordingPin {
    pub fn new(timeline: &SharedTimeline) -> Self {
        Self {
            timeline: Rc::clone(timeline),
            fail_low_at: None,
            lows: 0,
        }
    }

    pub fn failing_low_at(timeline: &SharedTimeline, n: usize) -> Self {
        Self {
            fail_low_at: Some(n),
            ..Self::new(timeline)
        }
    }
}

impl ErrorType for RecordingPin {
    type Error = PinFault;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        let n = self.lows;
        self.lows += 1;
        if self.fail_low_at == Some(n) {
            return Err(PinFault);
        }
        let mut t = self.timeline.borrow_mut();
        let now = t.now_ms;
        t.edges.push((now, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        let mut t = self.timeline.borrow_mut();
        let now = t.now_ms;
        t.edges.push((now, true));
        Ok(())
    }
}

#[allow(dead_code)]
impl Timeline {
    /// Last written level, `None` before any write.
    pub fn level(&self) -> Option<bool> {
        self.edges.last().map(|&(_, high)| high)
    }

    pub fn high_edges(&self) -> Vec<u64> {
        self.edges.iter().filter(|(_, high)| *high).map(|&(t, _)| t).collect()
    }
}

// ── Sensors ───────────────────────────────────────────────────

/// Replays a script; the last entry repeats forever.
pub struct ScriptedSensors {
    script: VecDeque<Result<RawReadings, SensorError>>,
    last: Result<RawReadings, SensorError>,
    pub reads: u32,
}

#[allow(dead_code)]
impl ScriptedSensors {
    pub fn new(script: Vec<Result<RawReadings, SensorError>>) -> Self {
        Self {
            script: script.into(),
            last: Err(SensorError::AdcReadFailed),
            reads: 0,
        }
    }

    pub fn constant(moisture: u16, light: u16) -> Self {
        Self::new(vec![Ok(RawReadings { moisture, light })])
    }
}

impl SensorPort for ScriptedSensors {
    fn read_raw(&mut self) -> Result<RawReadings, SensorError> {
        self.reads += 1;
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
    }
}

/// Presses the calibration button after every `every` reads.
pub struct ButtonPressEvery<'a, S> {
    pub inner: S,
    signal: &'a TerminationSignal,
    every: u32,
    count: u32,
}

impl<'a, S> ButtonPressEvery<'a, S> {
    pub fn new(inner: S, signal: &'a TerminationSignal, every: u32) -> Self {
        Self {
            inner,
            signal,
            every,
            count: 0,
        }
    }
}

impl<S: SensorPort> SensorPort for ButtonPressEvery<'_, S> {
    fn read_raw(&mut self) -> Result<RawReadings, SensorError> {
        let r = self.inner.read_raw();
        self.count += 1;
        if self.count % self.every == 0 {
            self.signal.trigger();
        }
        r
    }
}

pub fn raw(moisture: u16, light: u16) -> Result<RawReadings, SensorError> {
    Ok(RawReadings { moisture, light })
}

// ── Network ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNet {
    pub connected: bool,
    pub polls: u32,
}

#[allow(dead_code)]
impl MockNet {
    pub fn online() -> Self {
        Self {
            connected: true,
            polls: 0,
        }
    }

    pub fn offline() -> Self {
        Self::default()
    }
}

impl ConnectivityPort for MockNet {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.connected {
            Ok(())
        } else {
            Err(ConnectivityError::ConnectionFailed)
        }
    }

    fn poll(&mut self) {
        self.polls += 1;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ── Decision service ──────────────────────────────────────────

/// Answers from a queue; the last answer repeats.
pub struct MockDecider {
    answers: VecDeque<Result<WateringDecision, DecisionError>>,
    last: Result<WateringDecision, DecisionError>,
    pub requests: Vec<DecisionRequest>,
}

#[allow(dead_code)]
impl MockDecider {
    pub fn answering(answers: Vec<Result<WateringDecision, DecisionError>>) -> Self {
        Self {
            answers: answers.into(),
            last: Err(DecisionError::Transport),
            requests: Vec::new(),
        }
    }

    /// Answer every request with this HTTP status and body.
    pub fn http(status: u16, body: &str) -> Self {
        Self::answering(vec![parse_decision_response(status, body.as_bytes())])
    }

    pub fn water(yes: bool) -> Self {
        Self::answering(vec![Ok(WateringDecision {
            needs_watering: yes,
            message: if yes { "soil is dry".into() } else { "soil is fine".into() },
        })])
    }

    pub fn failing(e: DecisionError) -> Self {
        Self::answering(vec![Err(e)])
    }
}

impl DecisionPort for MockDecider {
    fn decide(&mut self, request: &DecisionRequest) -> Result<WateringDecision, DecisionError> {
        self.requests.push(*request);
        if let Some(next) = self.answers.pop_front() {
            self.last = next;
        }
        self.last.clone()
    }
}

// ── Event sink ────────────────────────────────────────────────

/// Event sink that records all emitted events.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
