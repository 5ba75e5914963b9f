//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements       | Connects to                    |
//! |-----------------|------------------|--------------------------------|
//! | `config_source` | ConfigPort       | JSON file / embedded document  |
//! | `device_id`     |                  | eFuse factory MAC              |
//! | `hardware`      | PinProvider      | ESP32-S3 GPIO, ADC1            |
//! | `log_sink`      | EventSink        | Serial log output              |
//! | `mqtt`          | PubSubPort       | ESP-IDF MQTT / rumqttc         |
//! | `time`          | TimePort         | ESP32 system timer             |
//! | `wifi`          | ConnectivityPort | ESP-IDF WiFi STA               |

pub mod config_source;
pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub(crate) mod utils;
pub mod wifi;
