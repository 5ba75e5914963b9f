//! Inbound command handling end to end: transport inbox → router →
//! registry → acknowledgement.

use futures_lite::future::block_on;
use serde_json::json;

use greenhouse::app::events::AppEvent;
use greenhouse::app::router::RouteOutcome;
use greenhouse::drivers::actuator::SwitchState;
use greenhouse::error::{CommandError, TransportError};

use crate::mock_hw::{Bench, RecordingTransport};

fn drain(bench: &Bench) -> usize {
    block_on(bench.runtime.drain_inbound())
}

fn acks(bench: &Bench) -> Vec<serde_json::Value> {
    bench.runtime.transport().borrow().published_on("dev1/data")
}

fn ignored(bench: &Bench) -> Vec<CommandError> {
    bench
        .events()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::CommandRouted { outcome: RouteOutcome::Ignored(r), .. } => Some(r),
            _ => None,
        })
        .collect()
}

#[test]
fn actuator_on_is_applied_and_acknowledged() {
    let bench = Bench::new();
    bench.runtime.transport().borrow_mut().push("dev1/actuators/pump_1/on", "");
    assert_eq!(drain(&bench), 1);

    assert_eq!(acks(&bench), vec![json!({"actuator": "pump_1", "data": {"state": "ON"}})]);
    assert!(!bench.board.level(5));
}

#[test]
fn unsupported_action_mutates_and_publishes_nothing() {
    let bench = Bench::new();
    let before = bench.board.level(5);
    bench.runtime.transport().borrow_mut().push("dev1/actuators/pump_1/explode", "");
    drain(&bench);

    assert!(bench.runtime.transport().borrow().published.is_empty());
    assert_eq!(bench.board.level(5), before);
    assert_eq!(ignored(&bench), vec![CommandError::UnsupportedAction]);
}

#[test]
fn sensor_read_reports_calibrated_moisture() {
    let bench = Bench::new();
    bench.runtime.transport().borrow_mut().push("dev1/sensors/soil_1/read", "");
    drain(&bench);

    assert_eq!(
        acks(&bench),
        vec![json!({"sensor": "soil_1", "data": {"moisture": {"value": 50.0, "unit": "percent"}}})]
    );
}

#[test]
fn climate_read_reports_both_quantities() {
    let bench = Bench::new();
    bench.runtime.transport().borrow_mut().push("dev1/sensors/air/", "read");
    drain(&bench);

    assert_eq!(
        acks(&bench),
        vec![json!({"sensor": "air", "data": {
            "temperature": {"value": 21.0, "unit": "celsius"},
            "humidity": {"value": 60.0, "unit": "percent"}
        }})]
    );
}

#[test]
fn malformed_topics_are_ignored() {
    let bench = Bench::new();
    {
        let mut t = bench.runtime.transport().borrow_mut();
        t.push("dev1/actuators", "on");
        t.push("dev1", "");
        t.push("dev1/valves/v1/open", "");
    }
    assert_eq!(drain(&bench), 3);
    assert!(bench.runtime.transport().borrow().published.is_empty());
    assert_eq!(ignored(&bench), vec![CommandError::MalformedCommand; 3]);
}

#[test]
fn unknown_devices_are_ignored() {
    let bench = Bench::new();
    {
        let mut t = bench.runtime.transport().borrow_mut();
        t.push("dev1/actuators/heater/on", "");
        t.push("dev1/sensors/ph_1/read", "");
    }
    drain(&bench);
    assert_eq!(ignored(&bench), vec![CommandError::UnknownTarget, CommandError::UnknownTarget]);
}

#[test]
fn batch_is_applied_in_arrival_order() {
    let bench = Bench::new();
    {
        let mut t = bench.runtime.transport().borrow_mut();
        t.push("dev1/actuators/pump_1/on", "");
        t.push("dev1/actuators/pump_1/off", "");
        t.push("dev1/actuators/pump_1/", "TOGGLE");
    }
    assert_eq!(drain(&bench), 3);

    let states: Vec<_> = acks(&bench).iter().map(|a| a["data"]["state"].clone()).collect();
    assert_eq!(states, vec![json!("ON"), json!("OFF"), json!("ON")]);
}

#[test]
fn lost_ack_still_counts_as_applied() {
    let bench = Bench::new();
    bench.runtime.transport().borrow_mut().fail_publish = true;
    bench.runtime.transport().borrow_mut().push("dev1/actuators/fan_1/on", "");
    drain(&bench);

    let fan = bench.runtime.registry().get_actuator("fan_1").unwrap();
    assert_eq!(fan.state(), SwitchState::On);

    let events = bench.events();
    assert_eq!(
        events[0],
        AppEvent::TransportFailure {
            topic: Some("dev1/data".into()),
            error: TransportError::PublishFailed
        }
    );
    assert!(matches!(&events[1], AppEvent::CommandRouted { outcome: RouteOutcome::Applied(_), .. }));
}

#[test]
fn nothing_drained_while_offline() {
    let bench = Bench::with_transport(RecordingTransport::default());
    bench.runtime.transport().borrow_mut().push("dev1/actuators/pump_1/on", "");
    assert_eq!(drain(&bench), 0);
    assert_eq!(bench.runtime.transport().borrow().inbox.len(), 1);
    assert_eq!(bench.runtime.registry().get_actuator("pump_1").unwrap().state(), SwitchState::Off);
}

#[test]
fn dispatch_returns_the_outcome() {
    let bench = Bench::new();
    let msg = greenhouse::app::ports::InboundMessage::new("dev1/actuators/pump_1/toggle", b"")
        .unwrap();
    let outcome = block_on(bench.runtime.dispatch(&msg));
    let RouteOutcome::Applied(ack) = outcome else { panic!("not applied") };
    assert_eq!(ack.topic, "dev1/data");
}
