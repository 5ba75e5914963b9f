//! Mock adapters for integration tests.
//!
//! Every port the runtime needs besides pins (those come from
//! [`SimBoard`]) gets a recording double here, so tests can assert on the
//! full publish/event history without a broker or a radio.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use core::cell::Cell;

use greenhouse::app::events::AppEvent;
use greenhouse::app::ports::{
    ClimateSample, ConnectivityPort, EventSink, InboundMessage, PubSubPort, TimePort,
};
use greenhouse::config::GreenhouseConfig;
use greenhouse::drivers::sim::SimBoard;
use greenhouse::error::{ConnectivityError, TransportError};
use greenhouse::registry::DeviceRegistry;
use greenhouse::scheduler::Runtime;

// ── RecordingTransport ────────────────────────────────────────

#[derive(Default)]
pub struct RecordingTransport {
    pub connected: bool,
    /// While set, `connect()` fails.
    pub refuse_connect: bool,
    /// While set, `connect()` starts a session the broker never accepts.
    pub withhold_connack: bool,
    /// While set, every publish fails.
    pub fail_publish: bool,
    pub connects: u32,
    pub disconnects: u32,
    pub published: Vec<(String, Vec<u8>)>,
    pub inbox: VecDeque<InboundMessage>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn online() -> Self {
        Self { connected: true, ..Self::default() }
    }

    pub fn push(&mut self, topic: &str, payload: &str) {
        let msg = InboundMessage::new(topic, payload.as_bytes()).expect("fits");
        self.inbox.push_back(msg);
    }

    pub fn published_on(&self, topic: &str) -> Vec<serde_json::Value> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| serde_json::from_slice(p).expect("json payload"))
            .collect()
    }
}

impl PubSubPort for RecordingTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.connects += 1;
        if self.refuse_connect {
            return Err(TransportError::ConnectFailed);
        }
        self.connected = !self.withhold_connack;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if self.fail_publish {
            return Err(TransportError::PublishFailed);
        }
        self.published.push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }

    fn poll_incoming(&mut self) -> Vec<InboundMessage> {
        self.inbox.drain(..).collect()
    }
}

// ── MockNetwork ───────────────────────────────────────────────

pub struct MockNetwork {
    pub up: bool,
    /// While unset, association requests never bring the link up.
    pub reachable: bool,
    pub connects: u32,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self { up: true, reachable: true, connects: 0 }
    }
}

impl ConnectivityPort for MockNetwork {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        self.connects += 1;
        self.up = self.reachable;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.up = false;
    }

    fn is_connected(&self) -> bool {
        self.up
    }

    fn set_credentials(&mut self, _ssid: &str, _password: &str) -> Result<(), ConnectivityError> {
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        self.up.then_some(-55)
    }
}

// ── VirtualTime ───────────────────────────────────────────────

/// Manually advanced clock.  `sleep` moves the clock forward by the
/// requested duration and yields once, so spawned tasks interleave.
#[derive(Default)]
pub struct VirtualTime {
    now_ms: Cell<u64>,
    sleeps: Cell<u32>,
}

#[allow(dead_code)]
impl VirtualTime {
    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl TimePort for VirtualTime {
    fn uptime_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration.as_millis() as u64);
        futures_lite::future::yield_now()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub type TestRuntime = Runtime<MockNetwork, RecordingTransport, VirtualTime, RecordingSink>;

pub const BENCH_CONFIG: &str = r#"{
    "client_id": "dev1",
    "actuators": [
        {"id": "pump_1", "pin": 5},
        {"id": "fan_1", "pin": 6, "polarity": "active_high"}
    ],
    "sensors": [
        {"id": "soil_1", "pin": 1, "type": "csmsv2", "calibration": {"dry": 50000, "wet": 20000}},
        {"id": "air", "pin": 15, "type": "dht11"}
    ],
    "buttons": [
        {"id": "btn_pump", "pin": 16, "target": "pump_1"},
        {"id": "btn_fan", "pin": 17, "target": "fan_1"}
    ],
    "timing": {"debounce_ms": 200, "climate_backoff_ms": 0, "reconnect_attempts": 3}
}"#;

pub struct Bench {
    pub board: SimBoard,
    pub runtime: TestRuntime,
}

#[allow(dead_code)]
impl Bench {
    pub fn new() -> Self {
        Self::with_transport(RecordingTransport::online())
    }

    pub fn with_transport(transport: RecordingTransport) -> Self {
        let config = GreenhouseConfig::from_json(BENCH_CONFIG).expect("bench config");
        let mut board = SimBoard::new();
        board.set_adc(1, 35_000);
        board.set_climate(15, Ok(ClimateSample { temperature_c: 21.0, humidity_pct: 60.0 }));
        let registry = DeviceRegistry::build(&config, &mut board).expect("registry");
        let runtime = Runtime::new(
            "dev1",
            std::rc::Rc::new(registry),
            config.timing.clone(),
            MockNetwork::default(),
            transport,
            VirtualTime::default(),
            RecordingSink::default(),
        );
        Self { board, runtime }
    }

    /// Press (`true`) or release a button wired active-low with pull-up.
    pub fn hold(&self, pin: u8, pressed: bool) {
        self.board.set_level(pin, !pressed);
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.runtime.sink().borrow().events.clone()
    }
}
