//! Control-loop branches against mock ports.

use irrigator::app::decision::WateringDecision;
use irrigator::app::events::AppEvent;
use irrigator::app::service::{CycleBranch, ControlLoop};
use irrigator::calibration::range::CalibrationProfile;
use irrigator::calibration::{CalibrationEngine, TerminationSignal};
use irrigator::config::{CalibrationConfig, SystemConfig};
use irrigator::control::duty_cycle::{ActuationController, DutyCycleSpec};
use irrigator::drivers::pump::PumpDriver;
use irrigator::error::{ActuatorError, DecisionError, Error, SensorError};
use irrigator::normalize::Percent;

use crate::mock_hw::{
    ButtonPressEvery, MockDecider, MockNet, RecordingPin, RecordingSink, ScriptedSensors, SharedTimeline,
    VirtualClock, VirtualDelay, raw, timeline,
};

/// Moisture 1000..3000, light 500..3500, from a two-sample sweep.
fn profile() -> CalibrationProfile {
    let signal = TerminationSignal::new();
    let tl = timeline();
    let script = vec![raw(3000, 500), raw(1000, 3500)];
    let mut sensors = ButtonPressEvery::new(ScriptedSensors::new(script), &signal, 2);
    let config = CalibrationConfig {
        sample_rate_hz: 10,
        min_spread: 200,
    };
    CalibrationEngine::new(&config, 4095, &signal)
        .run(&mut sensors, &VirtualClock(tl.clone()), &mut VirtualDelay(tl), &mut RecordingSink::new())
        .expect("sweep spans both channels")
}

fn config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.duty_cycle = DutyCycleSpec {
        period_ms: 100,
        duty_fraction: 0.2,
        total_duration_s: 1,
    };
    config
}

fn actuator(tl: &SharedTimeline) -> ActuationController<RecordingPin> {
    ActuationController::new(PumpDriver::new(RecordingPin::new(tl), false).unwrap())
}

#[test]
fn no_watering_needed_idles_for_a_minute() {
    let tl = timeline();
    let act = actuator(&tl);
    let mut control = ControlLoop::new(profile(), &config(), &act);
    let mut decider = MockDecider::http(200, r#"{"needs_watering": false, "message": "ok"}"#);
    let mut sink = RecordingSink::new();

    let outcome = control.run_cycle(
        &mut ScriptedSensors::constant(2000, 2000),
        &mut MockNet::online(),
        &mut decider,
        &mut VirtualDelay(tl.clone()),
        &mut sink,
    );

    assert_eq!(outcome.branch, CycleBranch::Idle);
    assert_eq!(outcome.wait_ms, 60_000);
    assert!(outcome.watering.is_none());
    assert!(tl.borrow().high_edges().is_empty());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::DecisionReceived(d) if !d.needs_watering)), 1);
}

#[test]
fn server_error_backs_off_without_watering() {
    let tl = timeline();
    let act = actuator(&tl);
    let mut control = ControlLoop::new(profile(), &config(), &act);
    let mut sink = RecordingSink::new();

    let outcome = control.run_cycle(
        &mut ScriptedSensors::constant(2000, 2000),
        &mut MockNet::online(),
        &mut MockDecider::http(500, "internal error"),
        &mut VirtualDelay(tl.clone()),
        &mut sink,
    );

    assert_eq!(outcome.branch, CycleBranch::DecisionFailed);
    assert_eq!(outcome.wait_ms, 10_000);
    assert!(tl.borrow().high_edges().is_empty());
    assert!(sink.events.contains(&AppEvent::DecisionFailed(DecisionError::Status(500))));
}

#[test]
fn malformed_and_timed_out_answers_take_failure_branch() {
    for (mut decider, expected) in [
        (MockDecider::http(200, "not json"), DecisionError::Malformed),
        (MockDecider::failing(DecisionError::Timeout), DecisionError::Timeout),
        (MockDecider::failing(DecisionError::Transport), DecisionError::Transport),
    ] {
        let tl = timeline();
        let act = actuator(&tl);
        let mut control = ControlLoop::new(profile(), &config(), &act);
        let mut sink = RecordingSink::new();

        let outcome = control.run_cycle(
            &mut ScriptedSensors::constant(2000, 2000),
            &mut MockNet::online(),
            &mut decider,
            &mut VirtualDelay(tl.clone()),
            &mut sink,
        );
        assert_eq!(outcome.branch, CycleBranch::DecisionFailed);
        assert!(sink.events.contains(&AppEvent::DecisionFailed(expected)));
        assert!(tl.borrow().high_edges().is_empty());
    }
}

#[test]
fn offline_skips_the_decision_service() {
    let tl = timeline();
    let act = actuator(&tl);
    let mut control = ControlLoop::new(profile(), &config(), &act);
    let mut net = MockNet::offline();
    let mut decider = MockDecider::water(true);
    let mut sink = RecordingSink::new();

    let outcome = control.run_cycle(
        &mut ScriptedSensors::constant(2000, 2000),
        &mut net,
        &mut decider,
        &mut VirtualDelay(tl.clone()),
        &mut sink,
    );

    assert_eq!(outcome.branch, CycleBranch::Offline);
    assert_eq!(outcome.wait_ms, 1_000);
    assert!(outcome.readings.is_some());
    assert!(decider.requests.is_empty());
    assert_eq!(net.polls, 1);
    assert!(sink.events.contains(&AppEvent::Offline));
}

#[test]
fn sensor_fault_backs_off_before_touching_network() {
    let tl = timeline();
    let act = actuator(&tl);
    let mut control = ControlLoop::new(profile(), &config(), &act);
    let mut decider = MockDecider::water(true);
    let mut sink = RecordingSink::new();

    let outcome = control.run_cycle(
        &mut ScriptedSensors::new(vec![Err(SensorError::AdcReadFailed)]),
        &mut MockNet::online(),
        &mut decider,
        &mut VirtualDelay(tl.clone()),
        &mut sink,
    );

    assert_eq!(outcome.branch, CycleBranch::SensorFault);
    assert_eq!(outcome.wait_ms, 10_000);
    assert!(outcome.readings.is_none());
    assert!(decider.requests.is_empty());
    assert_eq!(sink.events, vec![AppEvent::Fault(Error::Sensor(SensorError::AdcReadFailed))]);
}

#[test]
fn dry_soil_waters_then_rechecks_soon() {
    let tl = timeline();
    let act = actuator(&tl);
    let mut control = ControlLoop::new(profile(), &config(), &act);
    let mut sink = RecordingSink::new();

    let outcome = control.run_cycle(
        &mut ScriptedSensors::constant(2900, 3000),
        &mut MockNet::online(),
        &mut MockDecider::http(200, r#"{"needs_watering": true, "message": "dry"}"#),
        &mut VirtualDelay(tl.clone()),
        &mut sink,
    );

    assert_eq!(outcome.branch, CycleBranch::Watered);
    assert_eq!(outcome.wait_ms, 3_000);
    assert_eq!(outcome.watering.map(|r| r.pulses), Some(10));
    assert_eq!(tl.borrow().high_edges().len(), 10);
    assert_eq!(tl.borrow().level(), Some(false));
    assert!(sink.events.contains(&AppEvent::WateringStarted {
        pulses: 10,
        on_ms: 20,
        off_ms: 80,
    }));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::WateringFinished(_))), 1);
}

#[test]
fn request_carries_calibrated_percentages() {
    let tl = timeline();
    let act = actuator(&tl);
    let mut control = ControlLoop::new(profile(), &config(), &act);
    let mut decider = MockDecider::water(false);

    let outcome = control.run_cycle(
        &mut ScriptedSensors::constant(2000, 3500),
        &mut MockNet::online(),
        &mut decider,
        &mut VirtualDelay(tl),
        &mut RecordingSink::new(),
    );

    let readings = outcome.readings.unwrap();
    assert_eq!(readings.moisture, Percent::saturating(50));
    assert_eq!(readings.light, Percent::saturating(100));
    assert_eq!(decider.requests.len(), 1);
    assert_eq!(decider.requests[0].moisture.get(), 50);
    assert_eq!(decider.requests[0].light.get(), 100);
}

#[test]
fn busy_pump_is_reported_as_actuator_fault() {
    let tl = timeline();
    let act = actuator(&tl);
    let mut control = ControlLoop::new(profile(), &config(), &act);
    let mut sink = RecordingSink::new();

    let held = act.acquire().unwrap();
    let outcome = control.run_cycle(
        &mut ScriptedSensors::constant(2900, 3000),
        &mut MockNet::online(),
        &mut MockDecider::water(true),
        &mut VirtualDelay(tl.clone()),
        &mut sink,
    );
    drop(held);

    assert_eq!(outcome.branch, CycleBranch::ActuatorFault);
    assert_eq!(outcome.wait_ms, 10_000);
    assert!(sink.events.contains(&AppEvent::Fault(Error::Actuator(ActuatorError::Busy))));
    assert!(tl.borrow().high_edges().is_empty());
}

#[test]
fn step_blocks_for_the_branch_wait() {
    let tl = timeline();
    let act = actuator(&tl);
    let mut control = ControlLoop::new(profile(), &config(), &act);
    let mut sensors = ScriptedSensors::constant(2000, 2000);
    let mut net = MockNet::offline();
    let mut decider = MockDecider::water(false);
    let mut delay = VirtualDelay(tl.clone());
    let mut sink = RecordingSink::new();

    control.step(&mut sensors, &mut net, &mut decider, &mut delay, &mut sink);
    assert_eq!(tl.borrow().now_ms, 1_000);

    net.connected = true;
    control.step(&mut sensors, &mut net, &mut decider, &mut delay, &mut sink);
    assert_eq!(tl.borrow().now_ms, 61_000);
    assert_eq!(control.cycle_count(), 2);
    assert_eq!(sensors.reads, 2);
}

#[test]
fn loop_survives_a_run_of_mixed_failures() {
    let tl = timeline();
    let act = actuator(&tl);
    let mut control = ControlLoop::new(profile(), &config(), &act);
    let mut sensors = ScriptedSensors::new(vec![
        Err(SensorError::AdcReadFailed),
        raw(2900, 3000),
        raw(2900, 3000),
        raw(1200, 3000),
    ]);
    let mut decider = MockDecider::answering(vec![
        Err(DecisionError::Timeout),
        Ok(WateringDecision {
            needs_watering: true,
            message: String::new(),
        }),
        Ok(WateringDecision {
            needs_watering: false,
            message: String::new(),
        }),
    ]);
    let mut net = MockNet::online();
    let mut delay = VirtualDelay(tl.clone());
    let mut sink = RecordingSink::new();

    let branches: Vec<CycleBranch> = (0..4)
        .map(|_| control.step(&mut sensors, &mut net, &mut decider, &mut delay, &mut sink).branch)
        .collect();

    assert_eq!(
        branches,
        vec![
            CycleBranch::SensorFault,
            CycleBranch::DecisionFailed,
            CycleBranch::Watered,
            CycleBranch::Idle,
        ]
    );
    assert_eq!(tl.borrow().high_edges().len(), 10);
}
