//! Capacitive soil moisture sensor v2.0.
//!
//! The probe's analog output falls as the soil gets wetter.  A two-point
//! calibration (`dry`, `wet` raw samples on the 16-bit scale) maps a raw
//! sample linearly onto 0–100 %:
//!
//! ```text
//! pct = clamp(round1(((raw - dry) / (wet - dry)) * 100), 0, 100)
//! ```
//!
//! Samples outside `[min(dry, wet), max(dry, wet)]` are rejected rather
//! than clamped: they mean the probe is out of the soil or miswired.

use core::cell::RefCell;

use log::warn;
use serde::{Deserialize, Serialize};

use super::{Measurement, Readings, Unit};
use crate::app::ports::AnalogInput;
use crate::error::SensorError;

/// Two-point calibration on the 16-bit ADC scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    pub dry: u16,
    pub wet: u16,
}

impl Default for Calibration {
    /// Full-scale range: useful only until the probe is calibrated.
    fn default() -> Self {
        Self { dry: 65535, wet: 0 }
    }
}

impl Calibration {
    pub fn validate(&self) -> Result<(), SensorError> {
        if self.dry == self.wet {
            return Err(SensorError::InvalidCalibration);
        }
        Ok(())
    }

    /// `(min, max)` of the accepted raw interval.
    pub fn bounds(&self) -> (u16, u16) {
        (self.dry.min(self.wet), self.dry.max(self.wet))
    }

    pub fn percentage_from_raw(&self, raw: f64) -> Result<f64, SensorError> {
        self.validate()?;
        if !raw.is_finite() {
            return Err(SensorError::NonNumericInput);
        }
        let dry = f64::from(self.dry);
        let wet = f64::from(self.wet);
        let pct = (raw - dry) / (wet - dry) * 100.0;
        let pct = round_tenths(pct).clamp(0.0, 100.0);
        // `-0.0` would serialize with its sign.
        Ok(pct + 0.0)
    }

    /// Same conversion for a sample that arrived as JSON.  Only numbers
    /// are accepted.
    pub fn percentage_from_value(&self, raw: &serde_json::Value) -> Result<f64, SensorError> {
        self.validate()?;
        let raw = raw.as_f64().ok_or(SensorError::NonNumericInput)?;
        self.percentage_from_raw(raw)
    }
}

/// Round to one decimal on the exact binary value, ties to even.
fn round_tenths(pct: f64) -> f64 {
    format!("{pct:.1}").parse().unwrap_or(pct)
}

pub struct SoilSensor {
    id: String,
    gpio: u8,
    calibration: Calibration,
    adc: RefCell<Box<dyn AnalogInput>>,
}

impl SoilSensor {
    pub fn new(
        id: impl Into<String>,
        gpio: u8,
        calibration: Calibration,
        adc: Box<dyn AnalogInput>,
    ) -> Result<Self, SensorError> {
        calibration.validate()?;
        Ok(Self { id: id.into(), gpio, calibration, adc: RefCell::new(adc) })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Sample the ADC and check it against the calibration interval.
    pub fn read_raw(&self) -> Result<u16, SensorError> {
        let raw = self.adc.borrow_mut().read_u16()?;
        let (min, max) = self.calibration.bounds();
        if !(min..=max).contains(&raw) {
            return Err(SensorError::OutOfCalibrationRange { raw, min, max });
        }
        Ok(raw)
    }

    pub fn read_percentage(&self) -> Result<f64, SensorError> {
        let raw = self.read_raw()?;
        self.calibration.percentage_from_raw(f64::from(raw))
    }

    /// `{moisture: {value, unit: percent}}`, or `None` on any failure.
    pub fn read(&self) -> Option<Readings> {
        match self.read_percentage() {
            Ok(pct) => {
                let mut readings = Readings::new();
                readings.insert("moisture", Measurement { value: pct, unit: Unit::Percent });
                Some(readings)
            }
            Err(e) => {
                warn!("Soil[{}]: read failed on GPIO{}: {}", self.id, self.gpio, e);
                None
            }
        }
    }
}
