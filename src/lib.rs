//! GrowHub greenhouse controller library.
//!
//! Exposes the domain modules for integration testing and the binary.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; host builds run against the simulated board.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod sensors;

pub use error::{Error, Result};
