//! Fuzz target: soil calibration conversion
//!
//! Any `(dry, wet, raw)` triple either yields a percentage in `[0, 100]`
//! or one of the documented sensor errors.
//!
//! cargo fuzz run fuzz_soil_calibration

#![no_main]

use greenhouse::error::SensorError;
use greenhouse::sensors::soil::Calibration;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u16, u16, f64)| {
    let (dry, wet, raw) = input;
    let cal = Calibration { dry, wet };
    match cal.percentage_from_raw(raw) {
        Ok(pct) => assert!((0.0..=100.0).contains(&pct)),
        Err(SensorError::InvalidCalibration) => assert_eq!(dry, wet),
        Err(SensorError::NonNumericInput) => assert!(!raw.is_finite()),
        Err(e) => panic!("unexpected error {e:?}"),
    }
});
