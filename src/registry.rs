//! Device registry: every actuator, sensor and button, keyed by id.
//!
//! Built once at startup from the configuration tables, then shared
//! immutably (`Rc`) by all runtime tasks.  Entries are never added,
//! removed or replaced; only their pin state changes.

use std::collections::BTreeSet;
use std::time::Duration;

use log::{info, warn};

use crate::app::ports::PinProvider;
use crate::config::{GreenhouseConfig, SensorKind};
use crate::drivers::actuator::Actuator;
use crate::drivers::button::ManualButton;
use crate::error::{ConfigError, Error};
use crate::sensors::climate::ClimateSensor;
use crate::sensors::soil::SoilSensor;
use crate::sensors::Sensor;

/// Telemetry key holding actuator states; no sensor may use it as id.
pub const RESERVED_SENSOR_ID: &str = "actuators";

#[derive(Debug)]
pub struct DeviceRegistry {
    actuators: Vec<Actuator>,
    sensors: Vec<Sensor>,
    buttons: Vec<ManualButton>,
}

fn check_unique<'a>(ids: impl Iterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateId(id.to_owned()));
        }
    }
    Ok(())
}

impl DeviceRegistry {
    /// Claim every configured pin and construct the devices.
    ///
    /// Fails on duplicate ids within a category, the reserved sensor id,
    /// invalid soil calibration or a pin the provider cannot supply.
    pub fn build(config: &GreenhouseConfig, pins: &mut dyn PinProvider) -> Result<Self, Error> {
        check_unique(config.actuators.iter().map(|a| a.id.as_str()))?;
        check_unique(config.sensors.iter().map(|s| s.id.as_str()))?;
        check_unique(config.buttons.iter().map(|b| b.id.as_str()))?;
        if config.sensors.iter().any(|s| s.id == RESERVED_SENSOR_ID) {
            return Err(ConfigError::ReservedId(RESERVED_SENSOR_ID.to_owned()).into());
        }

        let mut actuators = Vec::with_capacity(config.actuators.len());
        for desc in &config.actuators {
            let line = pins.output(desc.pin)?;
            actuators.push(Actuator::new(desc.id.as_str(), desc.pin, desc.polarity, line));
            info!("Registry: actuator '{}' on GPIO{} ({:?})", desc.id, desc.pin, desc.polarity);
        }

        let timing = &config.timing;
        let mut sensors = Vec::with_capacity(config.sensors.len());
        for desc in &config.sensors {
            let sensor = match &desc.kind {
                SensorKind::Soil { calibration } => {
                    calibration.validate()?;
                    let adc = pins.analog(desc.pin)?;
                    Sensor::Soil(SoilSensor::new(desc.id.as_str(), desc.pin, *calibration, adc)?)
                }
                SensorKind::Climate => {
                    let probe = pins.climate_probe(desc.pin)?;
                    Sensor::Climate(ClimateSensor::new(
                        desc.id.as_str(),
                        desc.pin,
                        probe,
                        timing.climate_retries,
                        Duration::from_millis(u64::from(timing.climate_backoff_ms)),
                    ))
                }
            };
            info!("Registry: sensor '{}' ({}) on GPIO{}", desc.id, sensor.kind(), desc.pin);
            sensors.push(sensor);
        }

        let mut buttons = Vec::with_capacity(config.buttons.len());
        for desc in &config.buttons {
            let line = pins.input(desc.pin, desc.pull)?;
            if !actuators.iter().any(|a| a.id() == desc.target) {
                warn!(
                    "Registry: button '{}' targets unknown actuator '{}' (presses ignored)",
                    desc.id, desc.target
                );
            }
            buttons.push(ManualButton::new(
                desc.id.as_str(),
                desc.pin,
                desc.target.as_str(),
                desc.active_level,
                line,
            ));
            info!("Registry: button '{}' on GPIO{} -> '{}'", desc.id, desc.pin, desc.target);
        }

        Ok(Self { actuators, sensors, buttons })
    }

    pub fn get_actuator(&self, id: &str) -> Option<&Actuator> {
        self.actuators.iter().find(|a| a.id() == id)
    }

    pub fn get_sensor(&self, id: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.id() == id)
    }

    pub fn all_actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    pub fn all_sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn buttons(&self) -> &[ManualButton] {
        &self.buttons
    }
}
