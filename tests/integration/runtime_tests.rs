//! Runtime task bodies driven step by step against mock adapters.

use futures_lite::future::block_on;
use serde_json::json;

use greenhouse::app::events::AppEvent;
use greenhouse::drivers::actuator::SwitchState;
use greenhouse::error::TransportError;
use greenhouse::drivers::watchdog::TaskWatchdog;
use greenhouse::scheduler::{BROKER_CONNECT_TIMEOUT, Executor};

use crate::mock_hw::{Bench, RecordingTransport};

const PUMP_BTN: u8 = 16;
const FAN_BTN: u8 = 17;

fn pump_state(bench: &Bench) -> SwitchState {
    bench.runtime.registry().get_actuator("pump_1").unwrap().state()
}

fn fan_state(bench: &Bench) -> SwitchState {
    bench.runtime.registry().get_actuator("fan_1").unwrap().state()
}

fn feeds(bench: &Bench) -> u32 {
    bench.runtime.watchdog().map_or(0, TaskWatchdog::feeds)
}

/// Spawn the runtime and poll one task at a time, round robin.
/// `VirtualTime` sleeps reschedule at once, so the run queue never drains.
fn run_ticks(bench: &Bench, ticks: usize) {
    let executor: Executor<'_> = Executor::new();
    bench.runtime.spawn(&executor);
    for _ in 0..ticks {
        if !executor.try_tick() {
            break;
        }
    }
}

// ── Buttons ───────────────────────────────────────────────────

#[test]
fn press_toggles_target_once() {
    let bench = Bench::new();
    bench.hold(PUMP_BTN, true);
    assert_eq!(bench.runtime.poll_buttons(), 1);
    assert_eq!(pump_state(&bench), SwitchState::On);
    assert!(!bench.board.level(5), "active-low pump driven low when ON");

    assert_eq!(
        bench.events(),
        vec![AppEvent::ButtonPressed {
            button: "btn_pump".into(),
            target: "pump_1".into(),
            state: Some(SwitchState::On),
        }]
    );
}

#[test]
fn bouncing_contact_toggles_once_per_window() {
    let bench = Bench::new();
    let time = bench.runtime.time();

    bench.hold(PUMP_BTN, true);
    assert_eq!(bench.runtime.poll_buttons(), 1);
    for _ in 0..5 {
        time.advance(10);
        bench.hold(PUMP_BTN, false);
        assert_eq!(bench.runtime.poll_buttons(), 0);
        time.advance(10);
        bench.hold(PUMP_BTN, true);
        assert_eq!(bench.runtime.poll_buttons(), 0);
    }
    assert_eq!(pump_state(&bench), SwitchState::On);
}

#[test]
fn held_button_does_not_repeat() {
    let bench = Bench::new();
    bench.hold(PUMP_BTN, true);
    bench.runtime.poll_buttons();
    for _ in 0..10 {
        bench.runtime.time().advance(500);
        assert_eq!(bench.runtime.poll_buttons(), 0);
    }
    assert_eq!(pump_state(&bench), SwitchState::On);
}

#[test]
fn second_press_after_window_toggles_back() {
    let bench = Bench::new();
    let time = bench.runtime.time();

    bench.hold(PUMP_BTN, true);
    bench.runtime.poll_buttons();
    time.advance(300);
    bench.hold(PUMP_BTN, false);
    assert_eq!(bench.runtime.poll_buttons(), 0);
    time.advance(300);
    bench.hold(PUMP_BTN, true);
    assert_eq!(bench.runtime.poll_buttons(), 1);
    assert_eq!(pump_state(&bench), SwitchState::Off);
}

#[test]
fn one_button_never_suppresses_another() {
    let bench = Bench::new();
    bench.hold(PUMP_BTN, true);
    assert_eq!(bench.runtime.poll_buttons(), 1);

    bench.runtime.time().advance(10);
    bench.hold(FAN_BTN, true);
    assert_eq!(bench.runtime.poll_buttons(), 1);

    assert_eq!(pump_state(&bench), SwitchState::On);
    assert_eq!(fan_state(&bench), SwitchState::On);
    assert!(bench.board.level(6), "active-high fan driven high when ON");
}

#[test]
fn simultaneous_presses_both_count() {
    let bench = Bench::new();
    bench.hold(PUMP_BTN, true);
    bench.hold(FAN_BTN, true);
    assert_eq!(bench.runtime.poll_buttons(), 2);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_publishes_full_snapshot() {
    let bench = Bench::new();
    assert!(block_on(bench.runtime.publish_telemetry()));

    let sent = bench.runtime.transport().borrow().published_on("dev1/telemetry");
    assert_eq!(
        sent,
        vec![json!({
            "soil_1": {"moisture": {"value": 50.0, "unit": "percent"}},
            "air": {
                "temperature": {"value": 21.0, "unit": "celsius"},
                "humidity": {"value": 60.0, "unit": "percent"}
            },
            "actuators": {"pump_1": "OFF", "fan_1": "OFF"}
        })]
    );
    assert!(bench.events().iter().any(|e| matches!(
        e,
        AppEvent::TelemetryPublished { sensors_read: 2, sensors_failed: 0, .. }
    )));
}

#[test]
fn telemetry_skipped_while_disconnected() {
    let bench = Bench::with_transport(RecordingTransport::default());
    assert!(!block_on(bench.runtime.publish_telemetry()));
    assert!(bench.runtime.transport().borrow().published.is_empty());
    assert_eq!(bench.events(), vec![AppEvent::TelemetrySkipped]);
}

#[test]
fn telemetry_omits_failed_sensor() {
    let bench = Bench::new();
    bench.board.fail_adc(1);
    assert!(block_on(bench.runtime.publish_telemetry()));

    let sent = bench.runtime.transport().borrow().published_on("dev1/telemetry");
    assert!(sent[0].get("soil_1").is_none());
    assert!(sent[0].get("air").is_some());
    assert!(bench.events().iter().any(|e| matches!(
        e,
        AppEvent::TelemetryPublished { sensors_read: 1, sensors_failed: 1, .. }
    )));
}

#[test]
fn telemetry_publish_failure_is_reported() {
    let bench = Bench::new();
    bench.runtime.transport().borrow_mut().fail_publish = true;
    assert!(!block_on(bench.runtime.publish_telemetry()));
    assert_eq!(
        bench.events(),
        vec![AppEvent::TransportFailure {
            topic: Some("dev1/telemetry".into()),
            error: TransportError::PublishFailed,
        }]
    );
}

// ── Keepalive ─────────────────────────────────────────────────

#[test]
fn healthy_session_is_left_alone() {
    let bench = Bench::new();
    block_on(bench.runtime.keepalive());
    assert!(bench.events().is_empty());
    assert_eq!(bench.runtime.network().borrow().connects, 0);
    assert_eq!(bench.runtime.transport().borrow().connects, 0);
}

#[test]
fn keepalive_restores_network_then_broker() {
    let bench = Bench::new();
    bench.runtime.network().borrow_mut().up = false;
    bench.runtime.transport().borrow_mut().connected = false;

    block_on(bench.runtime.keepalive());

    assert_eq!(
        bench.events(),
        vec![AppEvent::NetworkLost, AppEvent::NetworkRestored, AppEvent::BrokerConnected]
    );
    assert_eq!(bench.runtime.network().borrow().connects, 1);
    assert_eq!(bench.runtime.transport().borrow().connects, 1);
    assert!(block_on(bench.runtime.publish_telemetry()));
}

#[test]
fn unreachable_network_gives_up_after_window() {
    let bench = Bench::new();
    {
        let mut net = bench.runtime.network().borrow_mut();
        net.up = false;
        net.reachable = false;
    }
    bench.runtime.transport().borrow_mut().connected = false;

    block_on(bench.runtime.keepalive());

    assert_eq!(
        bench.events(),
        vec![AppEvent::NetworkLost, AppEvent::ReconnectFailed { attempts: 3 }]
    );
    assert_eq!(bench.runtime.time().sleeps(), 3);
    assert_eq!(bench.runtime.transport().borrow().connects, 0, "broker untouched without a link");
}

#[test]
fn broker_refusal_is_reported() {
    let bench = Bench::new();
    {
        let mut t = bench.runtime.transport().borrow_mut();
        t.connected = false;
        t.refuse_connect = true;
    }
    block_on(bench.runtime.keepalive());
    assert_eq!(
        bench.events(),
        vec![AppEvent::TransportFailure { topic: None, error: TransportError::ConnectFailed }]
    );
}

#[test]
fn silent_broker_is_dropped_after_timeout() {
    let bench = Bench::new();
    {
        let mut t = bench.runtime.transport().borrow_mut();
        t.connected = false;
        t.withhold_connack = true;
    }
    block_on(bench.runtime.keepalive());

    assert_eq!(
        bench.events(),
        vec![AppEvent::TransportFailure { topic: None, error: TransportError::ConnectFailed }]
    );
    let polls = (BROKER_CONNECT_TIMEOUT.as_millis() / 50) as u32;
    assert_eq!(bench.runtime.time().sleeps(), polls, "waited with async sleeps");
    let t = bench.runtime.transport().borrow();
    assert_eq!((t.connects, t.disconnects), (1, 1));
}

// ── Executor ──────────────────────────────────────────────────

#[test]
fn watchdog_armed_only_once_tasks_run() {
    let bench = Bench::new();
    {
        let mut net = bench.runtime.network().borrow_mut();
        net.up = false;
        net.reachable = false;
    }
    bench.runtime.transport().borrow_mut().connected = false;

    assert!(bench.runtime.watchdog().is_none());
    assert!(!block_on(bench.runtime.connect_network()));
    assert!(bench.runtime.watchdog().is_none(), "waiting outside the executor arms nothing");

    run_ticks(&bench, 400);
    assert!(bench.events().contains(&AppEvent::ReconnectFailed { attempts: 3 }));
    assert!(feeds(&bench) > 1, "button task keeps feeding while keepalive waits");
}

#[test]
fn button_task_runs_while_broker_is_silent() {
    let bench = Bench::new();
    {
        let mut t = bench.runtime.transport().borrow_mut();
        t.connected = false;
        t.withhold_connack = true;
    }
    bench.hold(PUMP_BTN, true);

    run_ticks(&bench, 400);
    assert_eq!(pump_state(&bench), SwitchState::On);
    assert!(feeds(&bench) > 1);
    assert!(bench.events().contains(&AppEvent::TransportFailure {
        topic: None,
        error: TransportError::ConnectFailed,
    }));
}

#[test]
fn spawned_tasks_interleave() {
    let bench = Bench::new();
    bench.runtime.transport().borrow_mut().push("dev1/actuators/fan_1/on", "");

    run_ticks(&bench, 400);

    let events = bench.events();
    assert!(matches!(&events[0], AppEvent::Started { actuators: 2, sensors: 2, buttons: 2, .. }));
    assert!(events.iter().any(|e| matches!(e, AppEvent::TelemetryPublished { .. })));
    assert!(events.iter().any(|e| matches!(e, AppEvent::CommandRouted { .. })));
    assert_eq!(fan_state(&bench), SwitchState::On);
    assert!(feeds(&bench) > 0, "button task feeds the watchdog");
}
