//! ESP-IDF MQTT client.
//!
//! Compiled only for `target_os = "espidf"`.  The C client runs its own
//! task and reconnects by itself; `EspMqttConnection::next()` is pumped
//! on a small `mqtt-rx` thread.

use std::sync::Arc;

use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use log::{info, warn};

use super::{MqttSettings, Session};
use crate::error::TransportError;

const RX_STACK_SIZE: usize = 6 * 1024;

pub(super) struct PlatformClient {
    client: EspMqttClient<'static>,
}

impl PlatformClient {
    pub(super) fn start(settings: &MqttSettings, session: Arc<Session>) -> Result<Self, TransportError> {
        let url = format!("mqtt://{}:{}", settings.host, settings.port);
        let conf = MqttClientConfiguration {
            client_id: Some(settings.client_id.as_str()),
            username: settings.username.as_deref(),
            password: settings.password.as_deref(),
            keep_alive_interval: Some(settings.keepalive),
            ..Default::default()
        };

        let (client, connection) = EspMqttClient::new(&url, &conf).map_err(|e| {
            warn!("MQTT: client init failed: {}", e);
            TransportError::ConnectFailed
        })?;

        std::thread::Builder::new()
            .name("mqtt-rx".into())
            .stack_size(RX_STACK_SIZE)
            .spawn(move || event_loop(connection, session))
            .map_err(|e| {
                warn!("MQTT: failed to spawn receive thread: {}", e);
                TransportError::ConnectFailed
            })?;
        Ok(Self { client })
    }

    pub(super) fn subscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        self.client.subscribe(filter, QoS::AtMostOnce).map(|_| ()).map_err(|e| {
            warn!("MQTT: subscribe to {} failed: {}", filter, e);
            TransportError::SubscribeFailed
        })
    }

    pub(super) fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        self.client.enqueue(topic, QoS::AtMostOnce, false, payload).map(|_| ()).map_err(|e| {
            warn!("MQTT: publish to {} failed: {}", topic, e);
            TransportError::PublishFailed
        })
    }
}

fn event_loop(mut connection: EspMqttConnection, session: Arc<Session>) {
    while let Ok(event) = connection.next() {
        match event.payload() {
            EventPayload::Connected(_) => session.on_connected(),
            EventPayload::Disconnected => session.on_disconnected(),
            EventPayload::Received { topic: Some(topic), data, details: Details::Complete, .. } => {
                session.deliver(topic, data);
            }
            EventPayload::Received { .. } => {
                warn!("MQTT: fragmented message dropped");
            }
            EventPayload::Error(e) => warn!("MQTT: client error: {:?}", e),
            _ => {}
        }
    }
    session.on_disconnected();
    info!("MQTT: receive thread exiting");
}
