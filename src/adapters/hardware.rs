//! Hardware adapter: hands out ESP32-S3 peripherals as port handles.
//!
//! [`EspPins`] implements [`PinProvider`] over `esp_idf_hal::gpio::PinDriver`
//! (digital I/O, open-drain for the DHT11 data line) and the ADC1 oneshot
//! unit in [`hw_init`](crate::drivers::hw_init).  This is the only module
//! that turns a GPIO number from the configuration into a real pin.
//!
//! [`PinClaims`] is target-independent so the once-per-pin rule is tested
//! on the host too.

use crate::drivers::hw_init::MAX_GPIO;
use crate::error::HardwareError;

/// Bitmask of GPIO numbers already handed out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PinClaims(u64);

impl PinClaims {
    pub fn claim(&mut self, pin: u8) -> Result<(), HardwareError> {
        if pin > MAX_GPIO || self.is_claimed(pin) {
            return Err(HardwareError::PinUnavailable(pin));
        }
        self.0 |= 1 << pin;
        Ok(())
    }

    pub fn is_claimed(&self, pin: u8) -> bool {
        pin <= MAX_GPIO && self.0 & (1 << pin) != 0
    }
}

#[cfg(target_os = "espidf")]
pub use esp::EspPins;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_hal::delay::Ets;
    use esp_idf_hal::gpio::{AnyIOPin, PinDriver, Pull as HalPull};
    use esp_idf_svc::sys::EspError;
    use log::info;

    use super::PinClaims;
    use crate::app::ports::{
        AnalogInput, ClimateProbe, DigitalInput, DigitalOutput, PinProvider,
    };
    use crate::config::Pull;
    use crate::drivers::dht11::Dht11;
    use crate::drivers::hal::{HalInput, HalOutput};
    use crate::drivers::hw_init::{adc1_channel, adc1_read_u16, configure_adc1_channel};
    use crate::error::{HardwareError, SensorError};

    fn driver_err(e: EspError) -> HardwareError {
        HardwareError::Driver(e.code())
    }

    struct Adc1Input {
        channel: u8,
    }

    impl AnalogInput for Adc1Input {
        fn read_u16(&mut self) -> Result<u16, SensorError> {
            adc1_read_u16(self.channel)
        }
    }

    /// ESP32-S3 pin provider.
    #[derive(Default)]
    pub struct EspPins {
        claims: PinClaims,
    }

    impl EspPins {
        pub fn new() -> Self {
            Self::default()
        }

        fn take(&mut self, pin: u8) -> Result<AnyIOPin, HardwareError> {
            self.claims.claim(pin)?;
            // SAFETY: `claims` guarantees each GPIO number is materialised
            // at most once for the lifetime of the provider.
            Ok(unsafe { AnyIOPin::new(i32::from(pin)) })
        }
    }

    impl PinProvider for EspPins {
        fn output(&mut self, pin: u8) -> Result<Box<dyn DigitalOutput>, HardwareError> {
            let driver = PinDriver::output(self.take(pin)?).map_err(driver_err)?;
            info!("GPIO{}: output", pin);
            Ok(Box::new(HalOutput::new(pin, driver)))
        }

        fn input(&mut self, pin: u8, pull: Pull) -> Result<Box<dyn DigitalInput>, HardwareError> {
            let mut driver = PinDriver::input(self.take(pin)?).map_err(driver_err)?;
            let bias = match pull {
                Pull::Up => HalPull::Up,
                Pull::Down => HalPull::Down,
                Pull::None => HalPull::Floating,
            };
            driver.set_pull(bias).map_err(driver_err)?;
            info!("GPIO{}: input ({:?})", pin, pull);
            Ok(Box::new(HalInput::new(pin, driver)))
        }

        fn analog(&mut self, pin: u8) -> Result<Box<dyn AnalogInput>, HardwareError> {
            let channel = adc1_channel(pin).ok_or(HardwareError::NotAnalogCapable(pin))?;
            self.claims.claim(pin)?;
            configure_adc1_channel(channel)?;
            Ok(Box::new(Adc1Input { channel }))
        }

        fn climate_probe(&mut self, pin: u8) -> Result<Box<dyn ClimateProbe>, HardwareError> {
            let mut driver = PinDriver::input_output_od(self.take(pin)?).map_err(driver_err)?;
            driver.set_pull(HalPull::Up).map_err(driver_err)?;
            driver.set_high().map_err(driver_err)?;
            info!("GPIO{}: DHT11 data line", pin);
            Ok(Box::new(Dht11::new(driver, Ets)))
        }
    }
}
