//! System configuration
//!
//! Device tables (actuators, sensors, buttons), network credentials and
//! task timing for the greenhouse controller.  Loaded once at startup
//! through a [`ConfigPort`](crate::app::ports::ConfigPort) and never
//! re-read.

use serde::{Deserialize, Serialize};

use crate::adapters::utils::is_printable_ascii;
use crate::error::ConfigError;
use crate::sensors::soil::Calibration;

// ---------------------------------------------------------------------------
// Electrical conventions
// ---------------------------------------------------------------------------

/// Which output level switches an actuator ON.
///
/// Relay boards are usually active-low; MOSFET drivers active-high.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    ActiveLow,
    ActiveHigh,
}

impl Polarity {
    /// Output level (`true` = high) that represents the logical state `on`.
    pub fn level_for(self, on: bool) -> bool {
        match self {
            Self::ActiveHigh => on,
            Self::ActiveLow => !on,
        }
    }

    /// Logical state represented by the output level `high`.
    pub fn is_on(self, high: bool) -> bool {
        self.level_for(high)
    }
}

/// Input bias resistor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pull {
    #[default]
    Up,
    Down,
    None,
}

/// Logic level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

// ---------------------------------------------------------------------------
// Device descriptors
// ---------------------------------------------------------------------------

/// One ON/OFF output device (pump, fan, light).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorDescriptor {
    pub id: String,
    pub pin: u8,
    #[serde(default)]
    pub polarity: Polarity,
}

/// Closed set of supported sensor kinds, tagged by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SensorKind {
    /// Capacitive soil moisture sensor v2.0 on an ADC pin.
    #[serde(rename = "csmsv2", alias = "soil")]
    Soil {
        #[serde(default)]
        calibration: Calibration,
    },
    /// DHT11 temperature/humidity probe on a single-wire pin.
    #[serde(rename = "dht11", alias = "climate")]
    Climate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub id: String,
    pub pin: u8,
    #[serde(flatten)]
    pub kind: SensorKind,
}

/// A push button that toggles `target` when pressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonDescriptor {
    pub id: String,
    pub pin: u8,
    pub target: String,
    #[serde(default)]
    pub pull: Pull,
    /// Level read while the button is held down.
    #[serde(default)]
    pub active_level: Level,
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub ssid: String,
    pub password: String,
    pub broker_host: String,
    pub broker_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    /// MQTT keep-alive interval (seconds)
    pub mqtt_keepalive_secs: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            broker_host: "localhost".into(),
            broker_port: 1883,
            mqtt_username: None,
            mqtt_password: None,
            mqtt_keepalive_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Task cadence and retry parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between two button scan passes (milliseconds)
    pub button_poll_interval_ms: u32,
    /// Minimum spacing between accepted transitions of one button (milliseconds)
    pub debounce_ms: u32,
    /// Telemetry publish period (seconds)
    pub telemetry_interval_secs: u32,
    /// Inbound message drain period (milliseconds)
    pub inbound_poll_interval_ms: u32,
    /// Connectivity check period (seconds)
    pub keepalive_interval_secs: u32,
    /// Link probes after a reconnect is initiated
    pub reconnect_attempts: u32,
    /// Spacing between link probes (milliseconds)
    pub reconnect_poll_ms: u32,
    /// Climate measurement attempts per read
    pub climate_retries: u8,
    /// Wait between failed climate measurements (milliseconds)
    pub climate_backoff_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            button_poll_interval_ms: 20,  // 50 Hz scan
            debounce_ms: 200,
            telemetry_interval_secs: 10,
            inbound_poll_interval_ms: 100,
            keepalive_interval_secs: 30,
            reconnect_attempts: 10, // 10 × 1 s association window
            reconnect_poll_ms: 1000,
            climate_retries: 3,
            climate_backoff_ms: 2000, // DHT11 needs ~1 s between cycles
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.button_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("button_poll_interval_ms must be > 0"));
        }
        if self.telemetry_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("telemetry_interval_secs must be > 0"));
        }
        if self.inbound_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("inbound_poll_interval_ms must be > 0"));
        }
        if self.keepalive_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("keepalive_interval_secs must be > 0"));
        }
        if self.reconnect_attempts == 0 || self.reconnect_poll_ms == 0 {
            return Err(ConfigError::ValidationFailed("reconnect window must be non-empty"));
        }
        if self.climate_retries == 0 {
            return Err(ConfigError::ValidationFailed("climate_retries must be >= 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Root document
// ---------------------------------------------------------------------------

/// The whole startup configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreenhouseConfig {
    /// MQTT client id and topic prefix.  Derived from the MAC when absent.
    pub client_id: Option<String>,
    pub actuators: Vec<ActuatorDescriptor>,
    pub sensors: Vec<SensorDescriptor>,
    pub buttons: Vec<ButtonDescriptor>,
    pub network: NetworkConfig,
    pub timing: TimingConfig,
}

impl GreenhouseConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.timing.validate()?;
        if let Some(id) = &config.client_id {
            validate_client_id(id)?;
        }
        Ok(config)
    }
}

/// A client id becomes the first topic level, so it must not contain
/// separators or wildcards.
pub fn validate_client_id(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() || id.len() > 64 {
        return Err(ConfigError::ValidationFailed("client_id must be 1-64 bytes"));
    }
    if !is_printable_ascii(id) || id.contains(['/', '+', '#', ' ']) {
        return Err(ConfigError::ValidationFailed(
            "client_id must be printable ASCII without '/', '+', '#' or spaces",
        ));
    }
    Ok(())
}
