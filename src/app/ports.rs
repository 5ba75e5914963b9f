//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Registry / Router / Runtime (domain)
//! ```
//!
//! Hardware handles (pins, ADC channels, climate probes), the network
//! session, the pub/sub client, the clock and the event sink all live
//! behind these traits.  The runtime consumes them via generics, so the
//! domain core never touches ESP-IDF directly and the whole stack runs
//! on the host against the simulated board.

use core::future::Future;
use core::time::Duration;

use crate::config::{GreenhouseConfig, Pull};
use crate::error::{
    ConfigError, ConnectivityError, HardwareError, ProbeError, SensorError, TransportError,
};

// ───────────────────────────────────────────────────────────────
// Pin-level handles (driven adapters: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// A push-pull digital output.  Writes never fail from the caller's point
/// of view; adapters log driver errors and carry on.
pub trait DigitalOutput {
    fn set_level(&mut self, high: bool);

    /// Level last driven onto the pin.
    fn is_set_high(&mut self) -> bool;
}

/// A digital input (bias configured at construction).
pub trait DigitalInput {
    fn is_high(&mut self) -> bool;
}

/// One ADC channel, sampled on the 16-bit scale (0–65535).
pub trait AnalogInput {
    fn read_u16(&mut self) -> Result<u16, SensorError>;
}

/// One complete temperature/humidity measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

/// Single-wire climate probe (DHT11 on hardware).
pub trait ClimateProbe {
    /// Run one measurement cycle.  Blocks for the duration of the frame
    /// (a few milliseconds on a DHT11).
    fn measure(&mut self) -> Result<ClimateSample, ProbeError>;
}

/// Hands out hardware handles by GPIO number.  Each pin may be claimed once.
pub trait PinProvider {
    fn output(&mut self, pin: u8) -> Result<Box<dyn DigitalOutput>, HardwareError>;
    fn input(&mut self, pin: u8, pull: Pull) -> Result<Box<dyn DigitalInput>, HardwareError>;
    fn analog(&mut self, pin: u8) -> Result<Box<dyn AnalogInput>, HardwareError>;
    fn climate_probe(&mut self, pin: u8) -> Result<Box<dyn ClimateProbe>, HardwareError>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic clock plus a non-blocking sleep for the cooperative runtime.
pub trait TimePort {
    /// Milliseconds since boot.
    fn uptime_ms(&self) -> u64;

    /// Suspend the calling task for `duration`.  Other tasks keep running.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

// ───────────────────────────────────────────────────────────────
// Network session port
// ───────────────────────────────────────────────────────────────

/// Station-mode network session (Wi-Fi on hardware).
pub trait ConnectivityPort {
    /// Initiate association.  Returns once the request is issued; callers
    /// probe [`is_connected`](Self::is_connected) for the outcome.
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn rssi(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Pub/sub transport port
// ───────────────────────────────────────────────────────────────

/// Longest topic accepted from the broker.
pub const MAX_TOPIC_LEN: usize = 128;
/// Longest command payload accepted from the broker.
pub const MAX_PAYLOAD_LEN: usize = 256;

/// One message delivered by the broker on the command subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<MAX_TOPIC_LEN>,
    pub payload: heapless::String<MAX_PAYLOAD_LEN>,
}

impl InboundMessage {
    /// Build from raw broker data.  `None` if the topic or payload is too
    /// long or not UTF-8.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let payload = core::str::from_utf8(payload).ok()?;
        let mut msg = Self { topic: heapless::String::new(), payload: heapless::String::new() };
        msg.topic.push_str(topic).ok()?;
        msg.payload.push_str(payload).ok()?;
        Some(msg)
    }
}

/// MQTT-style pub/sub session.
///
/// Implementations subscribe to `<client_id>/+/+/+` on every (re)connect.
pub trait PubSubPort {
    /// Start opening a session.  Returns once the request is under way;
    /// `is_connected()` turns true when the broker accepts it.
    fn connect(&mut self) -> Result<(), TransportError>;
    /// Drop the current session, pending or established.
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError>;

    /// Take every message received since the previous call.
    fn poll_incoming(&mut self) -> Vec<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The runtime emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Read-only configuration source, consulted once at startup.
///
/// Implementations return a fully validated document; range errors are
/// reported as [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    fn load(&self) -> Result<GreenhouseConfig, ConfigError>;
}
