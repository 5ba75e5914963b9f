//! MQTT transport adapter.
//!
//! Implements [`PubSubPort`] over a broker session.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: `rumqttc` blocking client.
//!
//! ## Threading model
//!
//! Both clients deliver events on a foreign thread (`mqtt-rx`).  That
//! thread never touches the registry; it only pushes into the session's
//! bounded `embassy-sync` channel, which the inbound task drains:
//!
//! ```text
//! ┌──────────────┐ InboundMessage ┌────────────────┐
//! │  mqtt-rx     │───────────────▶│  inbound task  │
//! │  (thread)    │  Channel<16>   │  (executor)    │
//! └──────────────┘                └────────────────┘
//! ```
//!
//! `connect()` only starts a session; CONNACK flips `is_connected()` from
//! the receive thread.  Every (re)connect raises a resubscribe flag and
//! the next `poll_incoming()` subscribes to `<client_id>/+/+/+` again.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::{InboundMessage, PubSubPort};
use crate::config::NetworkConfig;
use crate::error::TransportError;

#[cfg(target_os = "espidf")]
mod esp_impl;
#[cfg(target_os = "espidf")]
use esp_impl as platform;

#[cfg(not(target_os = "espidf"))]
mod host_impl;
#[cfg(not(target_os = "espidf"))]
use host_impl as platform;

/// Inbound messages buffered between two drains.
pub const INBOUND_DEPTH: usize = 16;

/// Subscription filter for every command addressed to `client_id`.
pub fn command_filter(client_id: &str) -> String {
    format!("{client_id}/+/+/+")
}

// ───────────────────────────────────────────────────────────────
// Settings
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keepalive: Duration,
}

impl MqttSettings {
    pub fn from_config(client_id: &str, network: &NetworkConfig) -> Self {
        Self {
            host: network.broker_host.clone(),
            port: network.broker_port,
            client_id: client_id.to_owned(),
            username: network.mqtt_username.clone(),
            password: network.mqtt_password.clone(),
            keepalive: Duration::from_secs(u64::from(network.mqtt_keepalive_secs)),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Session state shared with the mqtt-rx thread
// ───────────────────────────────────────────────────────────────

/// One broker session.  A fresh session is created on every `connect()`,
/// so a stale receive thread can only ever write into a session nobody
/// reads any more.
pub(crate) struct Session {
    inbound: Channel<CriticalSectionRawMutex, InboundMessage, INBOUND_DEPTH>,
    connected: AtomicBool,
    resubscribe: AtomicBool,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            inbound: Channel::new(),
            connected: AtomicBool::new(false),
            resubscribe: AtomicBool::new(false),
        }
    }

    pub(crate) fn on_connected(&self) {
        info!("MQTT: CONNACK received");
        self.connected.store(true, Ordering::Release);
        self.resubscribe.store(true, Ordering::Release);
    }

    pub(crate) fn on_disconnected(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            warn!("MQTT: session lost");
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn take_resubscribe(&self) -> bool {
        self.resubscribe.swap(false, Ordering::AcqRel)
    }

    /// Called from the receive thread.  Never blocks.
    pub(crate) fn deliver(&self, topic: &str, payload: &[u8]) {
        let Some(msg) = InboundMessage::new(topic, payload) else {
            warn!("MQTT: dropped oversized or non-UTF-8 message on {}", topic);
            return;
        };
        if self.inbound.try_send(msg).is_err() {
            warn!("MQTT: inbound queue full, dropped message on {}", topic);
        }
    }

    fn drain(&self) -> Vec<InboundMessage> {
        core::iter::from_fn(|| self.inbound.try_receive().ok()).collect()
    }
}

// ───────────────────────────────────────────────────────────────
// Transport
// ───────────────────────────────────────────────────────────────

pub struct MqttTransport {
    settings: MqttSettings,
    filter: String,
    session: Arc<Session>,
    client: Option<platform::PlatformClient>,
}

impl MqttTransport {
    pub fn new(settings: MqttSettings) -> Self {
        Self {
            filter: command_filter(&settings.client_id),
            settings,
            session: Arc::new(Session::new()),
            client: None,
        }
    }

    pub fn settings(&self) -> &MqttSettings {
        &self.settings
    }

    fn resubscribe(&mut self) -> Result<(), TransportError> {
        let Some(client) = self.client.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        if !self.session.take_resubscribe() {
            return Ok(());
        }
        match client.subscribe(&self.filter) {
            Ok(()) => {
                info!("MQTT: subscribed to {}", self.filter);
                Ok(())
            }
            Err(e) => {
                self.session.resubscribe.store(true, Ordering::Release);
                Err(e)
            }
        }
    }
}

impl PubSubPort for MqttTransport {
    /// Start a fresh session and return.  The broker's CONNACK arrives
    /// on the receive thread and shows up in `is_connected()`.
    fn connect(&mut self) -> Result<(), TransportError> {
        if self.is_connected() {
            return Ok(());
        }
        self.disconnect();
        let session = Arc::new(Session::new());
        info!(
            "MQTT: connecting to {}:{} as '{}'",
            self.settings.host, self.settings.port, self.settings.client_id
        );
        let client = platform::PlatformClient::start(&self.settings, session.clone())?;
        self.session = session;
        self.client = Some(client);
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.client.take().is_some() {
            info!("MQTT: session to {}:{} dropped", self.settings.host, self.settings.port);
        }
        self.session = Arc::new(Session::new());
    }

    fn is_connected(&self) -> bool {
        self.client.is_some() && self.session.is_connected()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let client = self.client.as_mut().ok_or(TransportError::NotConnected)?;
        client.publish(topic, payload)
    }

    fn poll_incoming(&mut self) -> Vec<InboundMessage> {
        if self.client.is_some() {
            if let Err(e) = self.resubscribe() {
                warn!("MQTT: resubscribe failed: {}", e);
            }
        }
        self.session.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_covers_three_levels() {
        assert_eq!(command_filter("dev1"), "dev1/+/+/+");
    }

    #[test]
    fn settings_follow_network_config() {
        let net = NetworkConfig {
            broker_host: "10.0.0.2".into(),
            broker_port: 8883,
            mqtt_username: Some("grower".into()),
            ..NetworkConfig::default()
        };
        let s = MqttSettings::from_config("dev1", &net);
        assert_eq!(s.host, "10.0.0.2");
        assert_eq!(s.port, 8883);
        assert_eq!(s.username.as_deref(), Some("grower"));
        assert_eq!(s.password, None);
        assert_eq!(s.keepalive, Duration::from_secs(60));
    }

    #[test]
    fn session_queues_until_drained() {
        let s = Session::new();
        s.deliver("dev1/actuators/pump_1/on", b"");
        s.deliver("dev1/sensors/soil_1/read", b"");
        let batch = s.drain();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].topic.as_str(), "dev1/actuators/pump_1/on");
        assert!(s.drain().is_empty());
    }

    #[test]
    fn session_drops_overflow() {
        let s = Session::new();
        for _ in 0..INBOUND_DEPTH + 5 {
            s.deliver("dev1/actuators/pump_1/toggle", b"");
        }
        assert_eq!(s.drain().len(), INBOUND_DEPTH);
    }

    #[test]
    fn session_drops_non_utf8() {
        let s = Session::new();
        s.deliver("dev1/actuators/pump_1/", &[0xC3, 0x28]);
        assert!(s.drain().is_empty());
    }

    #[test]
    fn connect_raises_resubscribe_once() {
        let s = Session::new();
        s.on_connected();
        assert!(s.is_connected());
        assert!(s.take_resubscribe());
        assert!(!s.take_resubscribe());
        s.on_disconnected();
        assert!(!s.is_connected());
    }

    #[test]
    fn late_connack_on_dropped_session_is_ignored() {
        let net = NetworkConfig {
            broker_host: "127.0.0.1".into(),
            broker_port: 1,
            ..NetworkConfig::default()
        };
        let mut t = MqttTransport::new(MqttSettings::from_config("dev1", &net));
        t.session.on_connected();
        assert!(!t.is_connected());

        assert_eq!(t.connect(), Ok(()));
        assert!(t.client.is_some());
        assert!(!t.session.is_connected(), "new session waits for its own CONNACK");

        t.disconnect();
        assert!(t.client.is_none());
        assert!(!t.is_connected());
    }

    #[test]
    fn offline_transport_refuses_publish() {
        let mut t = MqttTransport::new(MqttSettings::from_config("dev1", &NetworkConfig::default()));
        assert!(!t.is_connected());
        assert_eq!(t.publish("dev1/data", b"{}"), Err(TransportError::NotConnected));
        assert!(t.poll_incoming().is_empty());
    }
}
