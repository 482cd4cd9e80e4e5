//! Calibration button: ISR-side debounce and the termination signal.
//!
//! ## Hardware
//!
//! Active-low momentary switch (the BOOT button) with pull-up.  The GPIO
//! fires on the falling edge; the ISR timestamps the edge, drops it if it
//! lands inside the debounce window of the previous one, and otherwise
//! triggers [`CALIBRATION_DONE`].
//!
//! ```text
//!   GPIO NEGEDGE ─▶ button_isr_handler(now_ms) ─▶ EdgeDebouncer
//!                                                     │ accepted
//!                                                     ▼
//!                               CALIBRATION_DONE.trigger()  (AtomicBool)
//!                                                     │
//!                          CalibrationEngine::run polls once per tick
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::digital::InputPin;

use crate::calibration::TerminationSignal;

const DEBOUNCE_MS: u32 = 50;

/// Raised by the button ISR; consumed by the calibration engine.
pub static CALIBRATION_DONE: TerminationSignal = TerminationSignal::new();

static BUTTON_DEBOUNCE: EdgeDebouncer = EdgeDebouncer::new(DEBOUNCE_MS);

/// Lock-free edge filter, safe to share with interrupt context.
pub struct EdgeDebouncer {
    window_ms: u32,
    last_edge_ms: AtomicU32,
    seen: AtomicBool,
}

impl EdgeDebouncer {
    pub const fn new(window_ms: u32) -> Self {
        Self {
            window_ms,
            last_edge_ms: AtomicU32::new(0),
            seen: AtomicBool::new(false),
        }
    }

    /// `true` if the edge at `now_ms` is a new press rather than bounce.
    /// Every edge restarts the window, so a bouncing contact counts once.
    pub fn accept(&self, now_ms: u32) -> bool {
        let last = self.last_edge_ms.swap(now_ms, Ordering::AcqRel);
        let first = !self.seen.swap(true, Ordering::AcqRel);
        first || now_ms.wrapping_sub(last) >= self.window_ms
    }
}

/// ISR handler: register this on the button GPIO falling edge.
/// Safe to call from interrupt context (atomics only).
pub fn button_isr_handler(now_ms: u32) {
    if BUTTON_DEBOUNCE.accept(now_ms) {
        CALIBRATION_DONE.trigger();
    }
}

/// Polled view of the button level.
pub struct CalibrationButton<I> {
    pin: I,
}

impl<I: InputPin> CalibrationButton<I> {
    pub fn new(pin: I) -> Self {
        Self { pin }
    }

    /// Active-low: pressed while the pin reads LOW.  A read error counts
    /// as released.
    pub fn is_pressed(&mut self) -> bool {
        self.pin.is_low().unwrap_or(false)
    }
}
