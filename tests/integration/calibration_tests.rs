//! Calibration sweep driven end-to-end on virtual time.

use irrigator::app::events::AppEvent;
use irrigator::app::ports::RawReadings;
use irrigator::calibration::{CalibrationEngine, CalibrationState, TerminationSignal};
use irrigator::config::CalibrationConfig;
use irrigator::error::{CalibrationError, Channel, SensorError};
use irrigator::normalize::Percent;

use crate::mock_hw::{ButtonPressEvery, RecordingSink, ScriptedSensors, VirtualClock, VirtualDelay, raw, timeline};

fn config() -> CalibrationConfig {
    CalibrationConfig {
        sample_rate_hz: 10,
        min_spread: 200,
    }
}

fn sweep() -> Vec<Result<RawReadings, SensorError>> {
    vec![raw(3000, 500), raw(2500, 1500), raw(2000, 2500), raw(1500, 3000), raw(1000, 3500)]
}

#[test]
fn sweep_then_press_freezes_profile() {
    let signal = TerminationSignal::new();
    let tl = timeline();
    let mut sensors = ButtonPressEvery::new(ScriptedSensors::new(sweep()), &signal, 5);
    let mut sink = RecordingSink::new();
    let mut engine = CalibrationEngine::new(&config(), 4095, &signal);

    let profile = engine
        .run(&mut sensors, &VirtualClock(tl.clone()), &mut VirtualDelay(tl.clone()), &mut sink)
        .expect("wide sweep must be accepted");

    assert_eq!(engine.state(), CalibrationState::Finalized);
    assert_eq!(profile.moisture_range().observed_min(), 1000);
    assert_eq!(profile.moisture_range().observed_max(), 3000);
    assert_eq!(profile.light_range().observed_min(), 500);
    assert_eq!(profile.light_range().observed_max(), 3500);

    // 10 Hz: one 100 ms wait per sample.
    assert_eq!(tl.borrow().sleeps, vec![100; 5]);
    assert_eq!(tl.borrow().now_ms, 500);

    assert_eq!(
        sink.events,
        vec![
            AppEvent::CalibrationStarted { sample_rate_hz: 10 },
            AppEvent::CalibrationFinalized { profile, samples: 5 },
        ]
    );
}

#[test]
fn stale_press_before_run_is_ignored() {
    let signal = TerminationSignal::new();
    signal.trigger();
    let tl = timeline();
    let mut sensors = ButtonPressEvery::new(ScriptedSensors::new(sweep()), &signal, 3);
    let mut engine = CalibrationEngine::new(&config(), 4095, &signal);

    engine
        .run(&mut sensors, &VirtualClock(tl.clone()), &mut VirtualDelay(tl), &mut RecordingSink::new())
        .unwrap();
    assert_eq!(sensors.inner.reads, 3);
}

#[test]
fn flat_sweep_is_rejected_then_recovered() {
    let signal = TerminationSignal::new();
    let tl = timeline();
    let mut script = vec![raw(2000, 2000); 3];
    script.extend([raw(3000, 500), raw(1000, 3500), raw(2000, 2000)]);
    let mut sensors = ButtonPressEvery::new(ScriptedSensors::new(script), &signal, 3);
    let mut sink = RecordingSink::new();
    let mut engine = CalibrationEngine::new(&config(), 4095, &signal);

    let profile = engine.run_until_accepted(
        &mut sensors,
        &VirtualClock(tl.clone()),
        &mut VirtualDelay(tl.clone()),
        &mut sink,
    );

    assert_eq!(
        sink.events[1],
        AppEvent::CalibrationRejected(CalibrationError::Degenerate {
            channel: Channel::Moisture,
            spread: 0,
        })
    );
    assert_eq!(sink.count(|e| matches!(e, AppEvent::CalibrationStarted { .. })), 2);
    assert!(matches!(sink.events[3], AppEvent::CalibrationFinalized { samples: 3, .. }));

    // Only the second sweep contributes.
    assert_eq!(profile.moisture_range().observed_min(), 1000);
    assert_eq!(profile.moisture_range().observed_max(), 3000);
    assert_eq!(tl.borrow().sleeps.len(), 6);
}

#[test]
fn sensor_failures_during_sweep_are_skipped() {
    let signal = TerminationSignal::new();
    let tl = timeline();
    let script = vec![
        raw(3000, 500),
        Err(SensorError::AdcReadFailed),
        raw(1000, 3500),
        Err(SensorError::AdcReadFailed),
    ];
    let mut sensors = ButtonPressEvery::new(ScriptedSensors::new(script), &signal, 4);
    let mut sink = RecordingSink::new();
    let mut engine = CalibrationEngine::new(&config(), 4095, &signal);

    engine
        .run(&mut sensors, &VirtualClock(tl.clone()), &mut VirtualDelay(tl), &mut sink)
        .unwrap();
    assert!(matches!(sink.events[1], AppEvent::CalibrationFinalized { samples: 2, .. }));
}

#[test]
fn profile_maps_midpoints_and_extremes() {
    let signal = TerminationSignal::new();
    let tl = timeline();
    let mut sensors = ButtonPressEvery::new(ScriptedSensors::new(sweep()), &signal, 5);
    let mut engine = CalibrationEngine::new(&config(), 4095, &signal);
    let profile = engine
        .run(&mut sensors, &VirtualClock(tl.clone()), &mut VirtualDelay(tl), &mut RecordingSink::new())
        .unwrap();

    let n = profile.normalize(RawReadings {
        moisture: 2000,
        light: 3500,
    });
    assert_eq!(n.moisture, Percent::saturating(50));
    assert_eq!(n.light, Percent::saturating(100));

    // Drier than anything seen during the sweep, and darker.
    let n = profile.normalize(RawReadings {
        moisture: 4000,
        light: 0,
    });
    assert_eq!(n.moisture.get(), 0);
    assert_eq!(n.light.get(), 0);
}

#[test]
fn second_run_after_finalize_is_refused() {
    let signal = TerminationSignal::new();
    let tl = timeline();
    let mut sensors = ButtonPressEvery::new(ScriptedSensors::new(sweep()), &signal, 5);
    let mut engine = CalibrationEngine::new(&config(), 4095, &signal);
    let clock = VirtualClock(tl.clone());
    let mut delay = VirtualDelay(tl);
    let mut sink = RecordingSink::new();

    let first = engine.run(&mut sensors, &clock, &mut delay, &mut sink).unwrap();
    assert_eq!(
        engine.run(&mut sensors, &clock, &mut delay, &mut sink),
        Err(CalibrationError::AlreadyFinalized)
    );
    assert_eq!(engine.profile(), Some(first));
}
