//! GrowHub greenhouse controller — main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspPins / SimBoard  LogEventSink  JsonConfigSource  Monotonic │
//! │  (PinProvider)       (EventSink)   (ConfigPort)      (TimePort)│
//! │  WifiAdapter         MqttTransport                             │
//! │  (Connectivity)      (PubSub)                                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  DeviceRegistry · CommandRouter · telemetry                    │
//! │                                                                │
//! │  Runtime: button-poll · telemetry · inbound · keepalive        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::rc::Rc;

use anyhow::Result;
use log::{info, warn};

use greenhouse::adapters::config_source::JsonConfigSource;
use greenhouse::adapters::device_id;
use greenhouse::adapters::log_sink::LogEventSink;
use greenhouse::adapters::mqtt::{MqttSettings, MqttTransport};
use greenhouse::adapters::time::MonotonicTime;
use greenhouse::adapters::wifi::WifiAdapter;
use greenhouse::app::ports::{ConfigPort, ConnectivityPort, PinProvider};
use greenhouse::config::GreenhouseConfig;
use greenhouse::registry::DeviceRegistry;
use greenhouse::scheduler::Runtime;

// ── Platform bring-up ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn init_logger() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn init_logger() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    Ok(())
}

#[cfg(target_os = "espidf")]
fn config_source() -> JsonConfigSource {
    JsonConfigSource::Embedded(include_str!("../config.json"))
}

#[cfg(not(target_os = "espidf"))]
fn config_source() -> JsonConfigSource {
    JsonConfigSource::from_env()
}

#[cfg(target_os = "espidf")]
fn bring_up(_config: &GreenhouseConfig) -> Result<(impl PinProvider, WifiAdapter)> {
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::EspWifi;
    use greenhouse::adapters::hardware::EspPins;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let driver = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    Ok((EspPins::new(), WifiAdapter::new(driver)))
}

/// Host: a simulated board seeded with plausible readings.
#[cfg(not(target_os = "espidf"))]
fn bring_up(config: &GreenhouseConfig) -> Result<(impl PinProvider, WifiAdapter)> {
    use greenhouse::app::ports::ClimateSample;
    use greenhouse::config::SensorKind;
    use greenhouse::drivers::sim::SimBoard;

    let board = SimBoard::new();
    for sensor in &config.sensors {
        match &sensor.kind {
            SensorKind::Soil { calibration } => {
                let (lo, hi) = calibration.bounds();
                board.set_adc(sensor.pin, lo / 2 + hi / 2);
            }
            SensorKind::Climate => {
                board.set_climate(
                    sensor.pin,
                    Ok(ClimateSample { temperature_c: 22.5, humidity_pct: 55.0 }),
                );
            }
        }
    }
    info!("Board(sim): {} sensors seeded", config.sensors.len());
    Ok((board, WifiAdapter::new()))
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    init_logger()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  GrowHub greenhouse v{:<16}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration + identity ───────────────────────────
    let config = config_source().load()?;
    let client_id = device_id::resolve_client_id(config.client_id.as_deref());
    info!("Identity: client id '{}'", client_id);

    // ── 3. Hardware + registry (fatal on any error) ───────────
    let (mut pins, mut wifi) = bring_up(&config)?;
    let registry = Rc::new(DeviceRegistry::build(&config, &mut pins)?);

    // ── 4. Network session + broker ───────────────────────────
    if let Err(e) = wifi.set_credentials(&config.network.ssid, &config.network.password) {
        warn!("WiFi: credentials rejected ({}), staying offline", e);
    }
    let transport = MqttTransport::new(MqttSettings::from_config(&client_id, &config.network));

    let runtime = Runtime::new(
        &client_id,
        registry,
        config.timing.clone(),
        wifi,
        transport,
        MonotonicTime::new(),
        LogEventSink::new(),
    );

    // ── 5. Run forever ────────────────────────────────────────
    // The keepalive task's first pass connects WiFi, then the broker.
    runtime.run();
    Ok(())
}
