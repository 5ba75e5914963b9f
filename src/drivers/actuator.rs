//! ON/OFF actuator driver (pump, fan, light).
//!
//! The logical state is always derived from the level last driven onto
//! the pin and the configured [`Polarity`]; there is no shadow copy that
//! could drift from the hardware.

use core::cell::RefCell;

use log::info;
use serde::Serialize;

use crate::app::ports::DigitalOutput;
use crate::config::Polarity;

/// Logical actuator state as reported in acks and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

pub struct Actuator {
    id: String,
    gpio: u8,
    polarity: Polarity,
    line: RefCell<Box<dyn DigitalOutput>>,
}

impl Actuator {
    /// Take ownership of `line` and force the actuator OFF.
    pub fn new(id: impl Into<String>, gpio: u8, polarity: Polarity, line: Box<dyn DigitalOutput>) -> Self {
        let act = Self { id: id.into(), gpio, polarity, line: RefCell::new(line) };
        act.off();
        act
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn on(&self) {
        info!("Actuator[{}]: ON (GPIO{})", self.id, self.gpio);
        self.line.borrow_mut().set_level(self.polarity.level_for(true));
    }

    pub fn off(&self) {
        info!("Actuator[{}]: OFF (GPIO{})", self.id, self.gpio);
        self.line.borrow_mut().set_level(self.polarity.level_for(false));
    }

    /// Invert the level currently on the pin.
    pub fn toggle(&self) {
        let mut line = self.line.borrow_mut();
        let high = line.is_set_high();
        line.set_level(!high);
        info!(
            "Actuator[{}]: toggled -> {} (GPIO{})",
            self.id,
            SwitchState::from(self.polarity.is_on(!high)).as_str(),
            self.gpio
        );
    }

    pub fn is_on(&self) -> bool {
        let high = self.line.borrow_mut().is_set_high();
        self.polarity.is_on(high)
    }

    pub fn state(&self) -> SwitchState {
        self.is_on().into()
    }
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl core::fmt::Debug for Actuator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Actuator")
            .field("id", &self.id)
            .field("gpio", &self.gpio)
            .field("polarity", &self.polarity)
            .finish_non_exhaustive()
    }
}
