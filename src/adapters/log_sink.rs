//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! tagged line to the ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::CalibrationStarted { sample_rate_hz } => {
                info!("CAL | sampling at {} Hz, sweep both probes then press the button", sample_rate_hz);
            }
            AppEvent::CalibrationFinalized { profile, samples } => {
                let m = profile.moisture_range();
                let l = profile.light_range();
                info!(
                    "CAL | finalized | samples={} | moisture={}..{} | light={}..{}",
                    samples,
                    m.observed_min(),
                    m.observed_max(),
                    l.observed_min(),
                    l.observed_max(),
                );
            }
            AppEvent::CalibrationRejected(e) => {
                warn!("CAL | rejected | {}", e);
            }
            AppEvent::Started(profile) => {
                info!(
                    "START | moisture axis {:?} | light axis {:?}",
                    profile.moisture_axis(),
                    profile.light_axis()
                );
            }
            AppEvent::Readings { raw, normalized } => {
                info!(
                    "READ | moisture raw={} adj={} | light raw={} adj={}",
                    raw.moisture, normalized.moisture, raw.light, normalized.light,
                );
            }
            AppEvent::Offline => {
                warn!("NET | offline, decision skipped");
            }
            AppEvent::DecisionReceived(d) => {
                info!("DECIDE | needs_watering={} | {}", d.needs_watering, d.message);
            }
            AppEvent::DecisionFailed(e) => {
                warn!("DECIDE | failed | {}", e);
            }
            AppEvent::WateringStarted { pulses, on_ms, off_ms } => {
                info!("PUMP | start | {} x {}ms on / {}ms off", pulses, on_ms, off_ms);
            }
            AppEvent::WateringFinished(r) => {
                info!("PUMP | done | pulses={} aborted={}", r.pulses, r.aborted);
            }
            AppEvent::Fault(e) => {
                warn!("FAULT | {}", e);
            }
        }
    }
}
