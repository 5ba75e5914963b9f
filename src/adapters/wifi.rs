//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`].  `connect()` only issues the
//! association request; the keepalive task probes `is_connected()` until
//! the link (and its IP interface) is up.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` in STA mode.
//! - **all other targets**: an in-memory link ([`SimLink`]) that tests can
//!   drop or make unreachable.

use log::{info, warn};

use super::utils::is_printable_ascii;
use crate::app::ports::ConnectivityPort;
use crate::error::ConnectivityError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Simulated link (host)
// ───────────────────────────────────────────────────────────────

/// Shared handle onto the simulated access point.
#[cfg(not(target_os = "espidf"))]
#[derive(Clone)]
pub struct SimLink {
    inner: std::rc::Rc<core::cell::Cell<(bool, bool)>>,
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimLink {
    fn default() -> Self {
        Self { inner: std::rc::Rc::new(core::cell::Cell::new((false, true))) }
    }
}

#[cfg(not(target_os = "espidf"))]
impl SimLink {
    pub fn is_up(&self) -> bool {
        self.inner.get().0
    }

    /// Force the link down (AP vanished, beacon loss).
    pub fn drop_link(&self) {
        let (_, reachable) = self.inner.get();
        self.inner.set((false, reachable));
    }

    /// While unreachable, association requests never bring the link up.
    pub fn set_reachable(&self, reachable: bool) {
        let (up, _) = self.inner.get();
        self.inner.set((up && reachable, reachable));
    }

    fn associate(&self) {
        let (_, reachable) = self.inner.get();
        self.inner.set((reachable, reachable));
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    driver: EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    link: SimLink,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(driver: EspWifi<'static>) -> Self {
        Self { ssid: heapless::String::new(), password: heapless::String::new(), driver }
    }

    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let auth_method =
            if self.password.is_empty() { AuthMethod::None } else { AuthMethod::WPA2Personal };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.driver.set_configuration(&conf).map_err(|e| {
            warn!("WiFi: set_configuration failed: {}", e);
            ConnectivityError::ConnectionFailed
        })?;
        if !self.driver.is_started().unwrap_or(false) {
            self.driver.start().map_err(|e| {
                warn!("WiFi: start failed: {}", e);
                ConnectivityError::ConnectionFailed
            })?;
        }
        self.driver.connect().map_err(|e| {
            warn!("WiFi: connect request failed: {}", e);
            ConnectivityError::ConnectionFailed
        })
    }

    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("WiFi: disconnect failed: {}", e);
        }
    }

    fn platform_is_connected(&self) -> bool {
        self.driver.is_up().unwrap_or(false)
    }

    fn platform_rssi(&self) -> Option<i8> {
        let mut info = esp_idf_svc::sys::wifi_ap_record_t::default();
        // SAFETY: fills `info` when the station is associated.
        let rc = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut info) };
        (rc == esp_idf_svc::sys::ESP_OK).then_some(info.rssi)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        Self::with_link(SimLink::default())
    }

    pub fn with_link(link: SimLink) -> Self {
        Self { ssid: heapless::String::new(), password: heapless::String::new(), link }
    }

    pub fn link(&self) -> SimLink {
        self.link.clone()
    }

    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.link.associate();
        info!("WiFi(sim): association requested for '{}'", self.ssid);
        Ok(())
    }

    fn platform_disconnect(&mut self) {
        self.link.drop_link();
    }

    fn platform_is_connected(&self) -> bool {
        self.link.is_up()
    }

    fn platform_rssi(&self) -> Option<i8> {
        self.link.is_up().then_some(-58)
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.platform_is_connected() {
            return Err(ConnectivityError::AlreadyConnected);
        }
        info!("WiFi: connecting to '{}'", self.ssid);
        self.platform_connect()
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        if self.platform_is_connected() { self.platform_rssi() } else { None }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
