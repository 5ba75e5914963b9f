//! Pin-level drivers: actuators, buttons, the DHT11 probe, embedded-hal
//! glue, ADC helpers, the task watchdog and the host board simulation.

pub mod actuator;
pub mod button;
pub mod dht11;
pub mod hal;
pub mod hw_init;
#[cfg(not(target_os = "espidf"))]
pub mod sim;
pub mod watchdog;
