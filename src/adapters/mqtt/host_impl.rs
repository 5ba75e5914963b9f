//! Host MQTT client over `rumqttc`.
//!
//! The blocking `Connection` iterator runs on its own `mqtt-rx` thread and
//! reconnects by itself on the next iteration after an error.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use rumqttc::{Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet, QoS};

use super::{MqttSettings, Session};
use crate::error::TransportError;

/// Requests queued between the transport and the event loop.
const REQUEST_CAPACITY: usize = 16;

/// Pause after a connection error before the iterator retries.
const RETRY_PAUSE: Duration = Duration::from_secs(1);

pub(super) struct PlatformClient {
    client: Client,
}

impl PlatformClient {
    pub(super) fn start(settings: &MqttSettings, session: Arc<Session>) -> Result<Self, TransportError> {
        let mut options =
            MqttOptions::new(settings.client_id.as_str(), settings.host.as_str(), settings.port);
        options.set_keep_alive(settings.keepalive);
        if let Some(username) = &settings.username {
            options.set_credentials(username.as_str(), settings.password.as_deref().unwrap_or(""));
        }

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        std::thread::Builder::new()
            .name("mqtt-rx".into())
            .spawn(move || event_loop(connection, session))
            .map_err(|e| {
                warn!("MQTT: failed to spawn receive thread: {}", e);
                TransportError::ConnectFailed
            })?;
        Ok(Self { client })
    }

    pub(super) fn subscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        self.client.try_subscribe(filter, QoS::AtMostOnce).map_err(|e| {
            warn!("MQTT: subscribe to {} failed: {}", filter, e);
            TransportError::SubscribeFailed
        })
    }

    pub(super) fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        self.client.try_publish(topic, QoS::AtMostOnce, false, payload.to_vec()).map_err(|e| {
            warn!("MQTT: publish to {} failed: {}", topic, e);
            TransportError::PublishFailed
        })
    }
}

fn event_loop(mut connection: Connection, session: Arc<Session>) {
    for notification in connection.iter() {
        // The transport has moved on to a newer session.
        if Arc::strong_count(&session) == 1 {
            break;
        }
        match notification {
            Ok(Event::Incoming(Packet::ConnAck(ack))) if ack.code == ConnectReturnCode::Success => {
                session.on_connected();
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                warn!("MQTT: broker refused session ({:?})", ack.code);
                session.on_disconnected();
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                session.deliver(&publish.topic, &publish.payload);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => session.on_disconnected(),
            Ok(_) => {}
            Err(e) => {
                if session.is_connected() {
                    warn!("MQTT: connection error: {}", e);
                }
                session.on_disconnected();
                std::thread::sleep(RETRY_PAUSE);
            }
        }
    }
    session.on_disconnected();
    info!("MQTT: receive thread exiting");
}
