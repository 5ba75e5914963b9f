//! Simulated board for host builds.
//!
//! Every pin is an embedded-hal pin over shared state, so the same
//! [`HalOutput`]/[`HalInput`] adapters used on hardware are exercised on
//! the host.  Tests (and the host binary) drive inputs, ADC samples and
//! climate readings through the [`SimBoard`] handle.

use core::cell::RefCell;
use core::convert::Infallible;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

use crate::app::ports::{
    AnalogInput, ClimateProbe, ClimateSample, DigitalInput, DigitalOutput, PinProvider,
};
use crate::config::Pull;
use crate::drivers::hal::{HalInput, HalOutput};
use crate::drivers::hw_init::{adc1_channel, MAX_GPIO};
use crate::error::{HardwareError, ProbeError, SensorError};

#[derive(Default)]
struct BoardState {
    levels: BTreeMap<u8, bool>,
    adc: BTreeMap<u8, Result<u16, SensorError>>,
    climate: BTreeMap<u8, VecDeque<Result<ClimateSample, ProbeError>>>,
    claimed: BTreeSet<u8>,
}

/// Cloneable handle to the simulated board.
#[derive(Clone, Default)]
pub struct SimBoard {
    state: Rc<RefCell<BoardState>>,
}

impl SimBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a pin (outputs: last driven; inputs: last injected).
    pub fn level(&self, pin: u8) -> bool {
        self.state.borrow().levels.get(&pin).copied().unwrap_or(false)
    }

    /// Drive an input pin from the outside world.
    pub fn set_level(&self, pin: u8, high: bool) {
        self.state.borrow_mut().levels.insert(pin, high);
    }

    /// Next (and every following) ADC sample on `pin`, 16-bit scale.
    pub fn set_adc(&self, pin: u8, raw: u16) {
        self.state.borrow_mut().adc.insert(pin, Ok(raw));
    }

    /// Make every following ADC read on `pin` fail.
    pub fn fail_adc(&self, pin: u8) {
        self.state.borrow_mut().adc.insert(pin, Err(SensorError::HardwareReadFailure));
    }

    /// Queue a climate probe result.  The last queued result repeats.
    pub fn push_climate(&self, pin: u8, result: Result<ClimateSample, ProbeError>) {
        self.state.borrow_mut().climate.entry(pin).or_default().push_back(result);
    }

    /// Replace the climate script for `pin` with a single repeating result.
    pub fn set_climate(&self, pin: u8, result: Result<ClimateSample, ProbeError>) {
        self.state.borrow_mut().climate.insert(pin, VecDeque::from([result]));
    }

    pub fn is_claimed(&self, pin: u8) -> bool {
        self.state.borrow().claimed.contains(&pin)
    }

    fn claim(&self, pin: u8) -> Result<(), HardwareError> {
        if pin > MAX_GPIO || !self.state.borrow_mut().claimed.insert(pin) {
            return Err(HardwareError::PinUnavailable(pin));
        }
        Ok(())
    }

    fn pin(&self, gpio: u8) -> SimPin {
        SimPin { gpio, state: self.state.clone() }
    }
}

/// One GPIO on the simulated board.
pub struct SimPin {
    gpio: u8,
    state: Rc<RefCell<BoardState>>,
}

impl SimPin {
    fn get(&self) -> bool {
        self.state.borrow().levels.get(&self.gpio).copied().unwrap_or(false)
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.state.borrow_mut().levels.insert(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.state.borrow_mut().levels.insert(self.gpio, true);
        Ok(())
    }
}

impl StatefulOutputPin for SimPin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.get())
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.get())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.get())
    }
}

struct SimAdc {
    gpio: u8,
    state: Rc<RefCell<BoardState>>,
}

impl AnalogInput for SimAdc {
    fn read_u16(&mut self) -> Result<u16, SensorError> {
        self.state.borrow().adc.get(&self.gpio).copied().unwrap_or(Ok(0))
    }
}

struct SimClimate {
    gpio: u8,
    state: Rc<RefCell<BoardState>>,
}

impl ClimateProbe for SimClimate {
    fn measure(&mut self) -> Result<ClimateSample, ProbeError> {
        let mut state = self.state.borrow_mut();
        let Some(script) = state.climate.get_mut(&self.gpio) else {
            return Err(ProbeError::Timeout);
        };
        if script.len() > 1 {
            script.pop_front().unwrap_or(Err(ProbeError::Timeout))
        } else {
            script.front().copied().unwrap_or(Err(ProbeError::Timeout))
        }
    }
}

impl PinProvider for SimBoard {
    fn output(&mut self, pin: u8) -> Result<Box<dyn DigitalOutput>, HardwareError> {
        self.claim(pin)?;
        Ok(Box::new(HalOutput::new(pin, self.pin(pin))))
    }

    fn input(&mut self, pin: u8, pull: Pull) -> Result<Box<dyn DigitalInput>, HardwareError> {
        self.claim(pin)?;
        {
            let mut state = self.state.borrow_mut();
            let idle = match pull {
                Pull::Up => true,
                Pull::Down | Pull::None => false,
            };
            state.levels.entry(pin).or_insert(idle);
        }
        Ok(Box::new(HalInput::new(pin, self.pin(pin))))
    }

    fn analog(&mut self, pin: u8) -> Result<Box<dyn AnalogInput>, HardwareError> {
        if adc1_channel(pin).is_none() {
            return Err(HardwareError::NotAnalogCapable(pin));
        }
        self.claim(pin)?;
        Ok(Box::new(SimAdc { gpio: pin, state: self.state.clone() }))
    }

    fn climate_probe(&mut self, pin: u8) -> Result<Box<dyn ClimateProbe>, HardwareError> {
        self.claim(pin)?;
        Ok(Box::new(SimClimate { gpio: pin, state: self.state.clone() }))
    }
}
