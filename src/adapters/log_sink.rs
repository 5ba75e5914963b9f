//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one log record per application
//! event (UART / USB-CDC on hardware, stderr on host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::app::router::RouteOutcome;

/// Adapter that logs every [`AppEvent`] to the console.
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
            AppEvent::Started { client_id, actuators, sensors, buttons } => {
                info!(
                    "START | client={} | actuators={} sensors={} buttons={}",
                    client_id, actuators, sensors, buttons
                );
            }
            AppEvent::CommandRouted { topic, outcome } => match outcome {
                RouteOutcome::Applied(ack) => {
                    info!("CMD | {} | applied -> {} ({} bytes)", topic, ack.topic, ack.payload.len());
                }
                RouteOutcome::Ignored(reason) => {
                    info!("CMD | {} | ignored: {}", topic, reason);
                }
            },
            AppEvent::ButtonPressed { button, target, state: Some(state) } => {
                info!("BTN | {} -> {} = {}", button, target, state.as_str());
            }
            AppEvent::ButtonPressed { button, target, state: None } => {
                warn!("BTN | {} -> {} (no such actuator)", button, target);
            }
            AppEvent::TelemetryPublished { sensors_read, sensors_failed, bytes } => {
                info!(
                    "TELEM | sensors ok={} failed={} | {} bytes",
                    sensors_read, sensors_failed, bytes
                );
            }
            AppEvent::TelemetrySkipped => {
                info!("TELEM | skipped (broker offline)");
            }
            AppEvent::NetworkLost => {
                warn!("NET | link lost, reconnecting");
            }
            AppEvent::NetworkRestored => {
                info!("NET | link restored");
            }
            AppEvent::ReconnectFailed { attempts } => {
                warn!("NET | still down after {} probes", attempts);
            }
            AppEvent::BrokerConnected => {
                info!("MQTT | session up");
            }
            AppEvent::TransportFailure { topic: Some(topic), error } => {
                warn!("MQTT | publish to {} failed: {}", topic, error);
            }
            AppEvent::TransportFailure { topic: None, error } => {
                warn!("MQTT | connect failed: {}", error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CommandError, TransportError};

    #[test]
    fn every_event_renders() {
        let mut sink = LogEventSink::new();
        let events = [
            AppEvent::Started { client_id: "dev".into(), actuators: 1, sensors: 2, buttons: 0 },
            AppEvent::CommandRouted {
                topic: "dev/x".into(),
                outcome: RouteOutcome::Ignored(CommandError::MalformedCommand),
            },
            AppEvent::ButtonPressed { button: "b".into(), target: "t".into(), state: None },
            AppEvent::TelemetrySkipped,
            AppEvent::ReconnectFailed { attempts: 10 },
            AppEvent::TransportFailure { topic: None, error: TransportError::ConnectFailed },
        ];
        for e in &events {
            sink.emit(e);
        }
    }
}
