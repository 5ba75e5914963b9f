//! Unified error types for the greenhouse firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! startup error handling uniform.  Per-cycle failures (sensor reads,
//! inbound commands, publishes) never reach the scheduler: the task that
//! observes them logs and skips.  Only startup errors abort the process.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible startup operation in the firmware funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be constructed or read.
    Sensor(SensorError),
    /// A hardware handle could not be acquired.
    Hardware(HardwareError),
    /// The pub/sub transport failed.
    Transport(TransportError),
    /// The network session rejected its parameters.
    Connectivity(ConnectivityError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Connectivity(e) => write!(f, "network: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The ADC or probe driver returned an error or timed out.
    HardwareReadFailure,
    /// Raw sample lies outside the configured calibration interval.
    OutOfCalibrationRange { raw: u16, min: u16, max: u16 },
    /// Calibration `dry` and `wet` points are equal.
    InvalidCalibration,
    /// A raw value handed to the conversion is not a finite number.
    NonNumericInput,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareReadFailure => write!(f, "hardware read failed"),
            Self::OutOfCalibrationRange { raw, min, max } => {
                write!(f, "raw value {raw} is outside calibration range [{min}, {max}]")
            }
            Self::InvalidCalibration => write!(f, "dry and wet calibration points cannot be equal"),
            Self::NonNumericInput => write!(f, "raw value must be numeric"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Probe errors (climate sensor transport)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeError {
    /// The probe did not answer within its protocol window.
    Timeout,
    /// Frame checksum mismatch.
    Checksum,
    /// GPIO access failed while talking to the probe.
    Gpio,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "probe timed out"),
            Self::Checksum => write!(f, "frame checksum mismatch"),
            Self::Gpio => write!(f, "GPIO access failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Command errors (router "ignored" reasons)
// ---------------------------------------------------------------------------

/// Why the command router ignored an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Topic does not match `<client>/<category>/<target>/<action>`.
    MalformedCommand,
    /// Target id is not registered.
    UnknownTarget,
    /// Action is not allowed for the category.
    UnsupportedAction,
    /// The sensor was read but produced no value.
    SensorUnavailable,
    /// The acknowledgement could not be encoded.
    Encoding,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedCommand => write!(f, "malformed command"),
            Self::UnknownTarget => write!(f, "unknown target"),
            Self::UnsupportedAction => write!(f, "unsupported action"),
            Self::SensorUnavailable => write!(f, "sensor unavailable"),
            Self::Encoding => write!(f, "acknowledgement encoding failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Broker connection could not be established.
    ConnectFailed,
    /// The session is not connected.
    NotConnected,
    /// A publish was rejected by the client.
    PublishFailed,
    /// The command subscription could not be placed.
    SubscribeFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "broker connect failed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Connectivity errors (network session)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// The pin number does not exist or is already claimed.
    PinUnavailable(u8),
    /// The pin has no ADC channel.
    NotAnalogCapable(u8),
    /// The underlying driver returned an error code.
    Driver(i32),
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinUnavailable(pin) => write!(f, "GPIO {pin} unavailable"),
            Self::NotAnalogCapable(pin) => write!(f, "GPIO {pin} has no ADC channel"),
            Self::Driver(rc) => write!(f, "driver error (rc={rc})"),
        }
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration source could not be read.
    Unreadable(String),
    /// The document is not valid configuration JSON.
    Parse(String),
    /// Two devices of the same category share an id.
    DuplicateId(String),
    /// A sensor uses an id reserved by the telemetry payload.
    ReservedId(String),
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(msg) => write!(f, "unreadable: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::DuplicateId(id) => write!(f, "duplicate device id '{id}'"),
            Self::ReservedId(id) => write!(f, "device id '{id}' is reserved"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
