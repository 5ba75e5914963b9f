//! Telemetry snapshot assembly.
//!
//! One payload per cycle:
//!
//! ```json
//! {"soil_1": {"moisture": {"value": 42.5, "unit": "percent"}},
//!  "air": {"temperature": {...}, "humidity": {...}},
//!  "actuators": {"pump_1": "OFF", "fan_1": "ON"}}
//! ```
//!
//! Sensors that fail to read are left out; actuator states are always
//! present.

use serde_json::{Map, Value};

use super::ports::TimePort;
use crate::registry::{DeviceRegistry, RESERVED_SENSOR_ID};

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub body: Value,
    pub sensors_read: usize,
    pub sensors_failed: usize,
}

impl TelemetrySnapshot {
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.body)
    }
}

/// Read every sensor and actuator in registry order.
pub async fn collect<T: TimePort>(registry: &DeviceRegistry, time: &T) -> TelemetrySnapshot {
    let mut body = Map::new();
    let mut sensors_read = 0;
    let mut sensors_failed = 0;

    for sensor in registry.all_sensors() {
        let value = sensor.read(time).await.and_then(|r| serde_json::to_value(r).ok());
        match value {
            Some(v) => {
                body.insert(sensor.id().to_owned(), v);
                sensors_read += 1;
            }
            None => sensors_failed += 1,
        }
    }

    let actuators: Map<String, Value> = registry
        .all_actuators()
        .iter()
        .map(|a| (a.id().to_owned(), Value::from(a.state().as_str())))
        .collect();
    body.insert(RESERVED_SENSOR_ID.to_owned(), Value::Object(actuators));

    TelemetrySnapshot { body: Value::Object(body), sensors_read, sensors_failed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::ClimateSample;
    use crate::config::GreenhouseConfig;
    use crate::drivers::sim::SimBoard;
    use crate::error::ProbeError;
    use core::future::Future;
    use core::time::Duration;
    use futures_lite::future::block_on;
    use serde_json::json;

    struct NoTime;

    impl TimePort for NoTime {
        fn uptime_ms(&self) -> u64 {
            0
        }
        fn sleep(&self, _: Duration) -> impl Future<Output = ()> {
            core::future::ready(())
        }
    }

    fn setup() -> (DeviceRegistry, SimBoard) {
        let config = GreenhouseConfig::from_json(
            r#"{
                "actuators": [{"id": "pump_1", "pin": 5}, {"id": "fan_1", "pin": 6}],
                "sensors": [
                    {"id": "soil_1", "pin": 1, "type": "csmsv2", "calibration": {"dry": 50000, "wet": 20000}},
                    {"id": "air", "pin": 15, "type": "dht11"}
                ],
                "timing": {"climate_backoff_ms": 0}
            }"#,
        )
        .unwrap();
        let mut board = SimBoard::new();
        let registry = DeviceRegistry::build(&config, &mut board).unwrap();
        (registry, board)
    }

    #[test]
    fn full_snapshot() {
        let (reg, board) = setup();
        board.set_adc(1, 35000);
        board.set_climate(15, Ok(ClimateSample { temperature_c: 22.0, humidity_pct: 55.0 }));
        reg.get_actuator("fan_1").unwrap().on();

        let snap = block_on(collect(&reg, &NoTime));
        assert_eq!(snap.sensors_read, 2);
        assert_eq!(snap.sensors_failed, 0);
        assert_eq!(
            snap.body,
            json!({
                "soil_1": {"moisture": {"value": 50.0, "unit": "percent"}},
                "air": {
                    "temperature": {"value": 22.0, "unit": "celsius"},
                    "humidity": {"value": 55.0, "unit": "percent"}
                },
                "actuators": {"pump_1": "OFF", "fan_1": "ON"}
            })
        );
        assert!(snap.encode().is_ok());
    }

    #[test]
    fn failed_sensor_omitted() {
        let (reg, board) = setup();
        board.fail_adc(1);
        board.set_climate(15, Err(ProbeError::Timeout));

        let snap = block_on(collect(&reg, &NoTime));
        assert_eq!(snap.sensors_failed, 2);
        assert_eq!(snap.body, json!({"actuators": {"pump_1": "OFF", "fan_1": "OFF"}}));
    }
}
