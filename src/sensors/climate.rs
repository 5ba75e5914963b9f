//! DHT11 climate sensor (temperature + relative humidity).
//!
//! DHT11 reads fail routinely (missed edges, checksum errors), so every
//! read is retried.  The wait between attempts is an async sleep on the
//! runtime clock: other tasks keep running while the probe settles.

use core::cell::RefCell;
use core::fmt;
use core::time::Duration;

use log::warn;

use super::{Measurement, Readings, Unit};
use crate::app::ports::{ClimateProbe, ClimateSample, TimePort};
use crate::error::ProbeError;

/// Why a single measurement attempt was discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClimateFault {
    Probe(ProbeError),
    InvalidTemperature(f64),
    InvalidHumidity(f64),
}

impl fmt::Display for ClimateFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe(e) => write!(f, "{e}"),
            Self::InvalidTemperature(t) => write!(f, "invalid temperature: {t}"),
            Self::InvalidHumidity(h) => write!(f, "invalid humidity: {h}"),
        }
    }
}

/// Accept a sample only if temperature is finite and humidity is a
/// finite percentage.
pub fn validate(sample: ClimateSample) -> Result<ClimateSample, ClimateFault> {
    if !sample.temperature_c.is_finite() {
        return Err(ClimateFault::InvalidTemperature(sample.temperature_c));
    }
    if !(0.0..=100.0).contains(&sample.humidity_pct) {
        // NaN fails the range check too.
        return Err(ClimateFault::InvalidHumidity(sample.humidity_pct));
    }
    Ok(sample)
}

pub struct ClimateSensor {
    id: String,
    gpio: u8,
    probe: RefCell<Box<dyn ClimateProbe>>,
    retries: u8,
    backoff: Duration,
}

impl ClimateSensor {
    pub fn new(
        id: impl Into<String>,
        gpio: u8,
        probe: Box<dyn ClimateProbe>,
        retries: u8,
        backoff: Duration,
    ) -> Self {
        Self { id: id.into(), gpio, probe: RefCell::new(probe), retries: retries.max(1), backoff }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    /// One measurement attempt, validated.
    pub fn measure_once(&self) -> Result<ClimateSample, ClimateFault> {
        let sample = self.probe.borrow_mut().measure().map_err(ClimateFault::Probe)?;
        validate(sample)
    }

    /// `{temperature: celsius, humidity: percent}`, or `None` once every
    /// attempt has failed.
    pub async fn read<T: TimePort>(&self, time: &T) -> Option<Readings> {
        for attempt in 1..=self.retries {
            match self.measure_once() {
                Ok(sample) => {
                    let mut readings = Readings::new();
                    readings.insert(
                        "temperature",
                        Measurement { value: sample.temperature_c, unit: Unit::Celsius },
                    );
                    readings.insert(
                        "humidity",
                        Measurement { value: sample.humidity_pct, unit: Unit::Percent },
                    );
                    return Some(readings);
                }
                Err(e) => {
                    warn!(
                        "Climate[{}]: attempt {}/{} failed on GPIO{}: {}",
                        self.id, attempt, self.retries, self.gpio, e
                    );
                }
            }
            if attempt < self.retries && !self.backoff.is_zero() {
                time.sleep(self.backoff).await;
            }
        }
        None
    }
}
