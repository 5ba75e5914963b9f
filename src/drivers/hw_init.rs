//! One-shot peripheral setup and ADC helpers.
//!
//! ESP32-S3 facts shared by the hardware pin provider and the host
//! simulation: the GPIO range, the GPIO→ADC1 channel map and the
//! 12-bit→16-bit sample scaling used by soil calibration values.
//! On ESP-IDF the ADC1 oneshot unit is created here with raw sys calls.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::error::{HardwareError, SensorError};

/// Highest GPIO number on the ESP32-S3.
pub const MAX_GPIO: u8 = 48;

/// ADC1 channel wired to `gpio`, if any.  ADC2 is not used: it is shared
/// with the Wi-Fi radio.
pub fn adc1_channel(gpio: u8) -> Option<u8> {
    match gpio {
        1..=10 => Some(gpio - 1),
        _ => None,
    }
}

/// Stretch a 12-bit sample over the full 16-bit range.
pub fn scale_12_to_16(raw: u16) -> u16 {
    let raw = raw & 0x0FFF;
    (raw << 4) | (raw >> 8)
}

// ── ADC1 (oneshot) ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: `ADC1_HANDLE` is written once by `init_adc1()` during startup,
/// before any task runs; afterwards it is only read from the runtime thread.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

/// Create the ADC1 oneshot unit.  Idempotent.
#[cfg(target_os = "espidf")]
pub fn init_adc1() -> Result<(), HardwareError> {
    // SAFETY: single-threaded startup path; see `adc1_handle`.
    unsafe {
        if !adc1_handle().is_null() {
            return Ok(());
        }
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let ret = adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE);
        if ret != ESP_OK as i32 {
            return Err(HardwareError::Driver(ret));
        }
    }
    info!("hw_init: ADC1 oneshot unit ready");
    Ok(())
}

/// Configure one ADC1 channel for 12-bit, 0–3.3 V sampling.
#[cfg(target_os = "espidf")]
pub fn configure_adc1_channel(channel: u8) -> Result<(), HardwareError> {
    init_adc1()?;
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    // SAFETY: handle initialised above.
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), u32::from(channel), &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HardwareError::Driver(ret));
    }
    info!("hw_init: ADC1 CH{} configured", channel);
    Ok(())
}

/// Sample one ADC1 channel, scaled to 16 bits.
#[cfg(target_os = "espidf")]
pub fn adc1_read_u16(channel: u8) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: see `adc1_handle`.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), u32::from(channel), &mut raw) };
    if ret != ESP_OK as i32 {
        log::warn!("ADC1 CH{}: read failed (rc={})", channel, ret);
        return Err(SensorError::HardwareReadFailure);
    }
    Ok(scale_12_to_16(raw.clamp(0, 0x0FFF) as u16))
}
