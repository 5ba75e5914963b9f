//! Application core — command routing and telemetry, zero I/O.
//!
//! Everything here reaches hardware and the network only through the
//! **port traits** in [`ports`], so the router and telemetry paths are
//! tested on the host against the simulated board.

pub mod commands;
pub mod events;
pub mod ports;
pub mod router;
pub mod telemetry;
