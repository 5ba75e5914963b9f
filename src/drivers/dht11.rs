//! DHT11 single-wire temperature/humidity probe.
//!
//! ## Protocol
//!
//! ```text
//!  host   ‾‾‾‾\______________/‾‾‾‾‾\       /‾‾‾‾‾‾‾‾\    /‾‾‾\    /‾‾‾‾‾‾‾\
//!  probe                             \_80µs_/  80µs   \50µs/ 0  \50µs/   1
//!             ≥18 ms start           response          26–28µs     70µs
//! ```
//!
//! 40 data bits follow the response: humidity (int, dec), temperature
//! (int, dec), checksum.  A bit is `1` when its high phase is longer than
//! the low phase that precedes it, which keeps decoding independent of
//! the exact loop speed.
//!
//! The driver is generic over embedded-hal so the same code runs on an
//! ESP-IDF open-drain `PinDriver` and on host-side test pins.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ClimateProbe, ClimateSample};
use crate::error::ProbeError;

/// Start pulse width (DHT11 needs at least 18 ms).
const START_LOW_MS: u32 = 20;
/// Upper bound on any single phase of the response (µs).
const PHASE_TIMEOUT_US: u32 = 100;

pub struct Dht11<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht11<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be open-drain with a pull-up; it idles released (high).
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Busy-wait while the line reads `level`.  Returns the elapsed µs.
    fn wait_while(&mut self, level: bool) -> Result<u32, ProbeError> {
        let mut elapsed = 0;
        while self.pin.is_high().map_err(|_| ProbeError::Gpio)? == level {
            if elapsed >= PHASE_TIMEOUT_US {
                return Err(ProbeError::Timeout);
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
        Ok(elapsed)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], ProbeError> {
        self.pin.set_low().map_err(|_| ProbeError::Gpio)?;
        self.delay.delay_ms(START_LOW_MS);
        self.pin.set_high().map_err(|_| ProbeError::Gpio)?;

        // Response: line released high, probe pulls low 80 µs, high 80 µs.
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            let low = self.wait_while(false)?;
            let high = self.wait_while(true)?;
            let byte = &mut frame[bit / 8];
            *byte = (*byte << 1) | u8::from(high > low);
        }
        Ok(frame)
    }
}

impl<P, D> ClimateProbe for Dht11<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn measure(&mut self) -> Result<ClimateSample, ProbeError> {
        let frame = self.read_frame();
        // Release the line whatever happened.
        let _ = self.pin.set_high();
        decode_frame(frame?)
    }
}

/// Validate and decode a raw 5-byte DHT11 frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<ClimateSample, ProbeError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(ProbeError::Checksum);
    }
    let humidity_pct = f64::from(frame[0]) + f64::from(frame[1]) / 10.0;
    let magnitude = f64::from(frame[2]) + f64::from(frame[3] & 0x7F) / 10.0;
    let temperature_c = if frame[3] & 0x80 != 0 { -magnitude } else { magnitude };
    Ok(ClimateSample { temperature_c, humidity_pct })
}
