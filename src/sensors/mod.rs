//! Sensor subsystem: the closed set of supported sensor kinds behind one
//! uniform `read() -> Option<Readings>` interface.
//!
//! A failed read is never an error for the caller: drivers log the cause
//! and return `None`, and the telemetry/command paths skip the sensor.

pub mod climate;
pub mod soil;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::app::ports::TimePort;
use climate::ClimateSensor;
use soil::SoilSensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Percent,
    Celsius,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    pub value: f64,
    pub unit: Unit,
}

/// Measurement name → value, serialized as a JSON object.
pub type Readings = BTreeMap<&'static str, Measurement>;

pub enum Sensor {
    Soil(SoilSensor),
    Climate(ClimateSensor),
}

impl Sensor {
    pub fn id(&self) -> &str {
        match self {
            Self::Soil(s) => s.id(),
            Self::Climate(c) => c.id(),
        }
    }

    pub fn gpio(&self) -> u8 {
        match self {
            Self::Soil(s) => s.gpio(),
            Self::Climate(c) => c.gpio(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Soil(_) => "csmsv2",
            Self::Climate(_) => "dht11",
        }
    }

    pub async fn read<T: TimePort>(&self, time: &T) -> Option<Readings> {
        match self {
            Self::Soil(s) => s.read(),
            Self::Climate(c) => c.read(time).await,
        }
    }
}

impl core::fmt::Debug for Sensor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sensor")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("gpio", &self.gpio())
            .finish()
    }
}
