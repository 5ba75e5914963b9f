//! Outbound application events.
//!
//! The runtime emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the stock adapter writes one log
//! line per event.

use crate::drivers::actuator::SwitchState;
use crate::error::TransportError;

use super::router::RouteOutcome;

/// Structured events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The runtime is about to spawn its tasks.
    Started {
        client_id: String,
        actuators: usize,
        sensors: usize,
        buttons: usize,
    },

    /// An inbound message reached a terminal outcome.
    CommandRouted { topic: String, outcome: RouteOutcome },

    /// A debounced button press was dispatched.  `state` is `None` when
    /// the button's target is not a registered actuator.
    ButtonPressed {
        button: String,
        target: String,
        state: Option<SwitchState>,
    },

    /// One telemetry payload went out.
    TelemetryPublished { sensors_read: usize, sensors_failed: usize, bytes: usize },

    /// A telemetry cycle was skipped because the broker session is down.
    TelemetrySkipped,

    /// The network session dropped; a reconnect is starting.
    NetworkLost,

    /// The network session came back.
    NetworkRestored,

    /// The reconnect window closed without a link.
    ReconnectFailed { attempts: u32 },

    /// The broker session is (re)established.
    BrokerConnected,

    /// A publish or broker connect failed.
    TransportFailure { topic: Option<String>, error: TransportError },
}
