//! embedded-hal adapters.
//!
//! Wraps any embedded-hal 1.0 pin into the crate's object-safe
//! [`DigitalOutput`] / [`DigitalInput`] handles.  Driver errors are logged
//! at `warn` and swallowed: a failed GPIO write must not take down the
//! task that issued it.

use embedded_hal::digital::{Error as _, InputPin, StatefulOutputPin};
use log::warn;

use crate::app::ports::{DigitalInput, DigitalOutput};

/// Output handle over an embedded-hal stateful output pin.
pub struct HalOutput<P> {
    gpio: u8,
    pin: P,
}

impl<P: StatefulOutputPin> HalOutput<P> {
    pub fn new(gpio: u8, pin: P) -> Self {
        Self { gpio, pin }
    }
}

impl<P: StatefulOutputPin> DigitalOutput for HalOutput<P> {
    fn set_level(&mut self, high: bool) {
        let res = if high { self.pin.set_high() } else { self.pin.set_low() };
        if let Err(e) = res {
            warn!("GPIO{}: write failed ({:?})", self.gpio, e.kind());
        }
    }

    fn is_set_high(&mut self) -> bool {
        match self.pin.is_set_high() {
            Ok(high) => high,
            Err(e) => {
                warn!("GPIO{}: output readback failed ({:?})", self.gpio, e.kind());
                false
            }
        }
    }
}

/// Input handle over an embedded-hal input pin.
pub struct HalInput<P> {
    gpio: u8,
    pin: P,
}

impl<P: InputPin> HalInput<P> {
    pub fn new(gpio: u8, pin: P) -> Self {
        Self { gpio, pin }
    }
}

impl<P: InputPin> DigitalInput for HalInput<P> {
    fn is_high(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high,
            Err(e) => {
                warn!("GPIO{}: read failed ({:?})", self.gpio, e.kind());
                false
            }
        }
    }
}
