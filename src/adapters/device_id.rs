//! Device identity derived from the ESP32 factory MAC address.
//!
//! When the configuration carries no `client_id`, the controller uses
//! `greenhouse-xxyyzz` (last 3 MAC bytes, lowercase hex).  The id is
//! stable across reboots and doubles as the MQTT topic prefix.

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// `greenhouse-xxyyzz`: 17 bytes.
pub type ClientIdString = heapless::String<24>;

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: writes exactly 6 bytes into `mac`.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

pub fn default_client_id(mac: &MacAddress) -> ClientIdString {
    use core::fmt::Write;
    let mut id = ClientIdString::new();
    let _ = write!(id, "greenhouse-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    id
}

/// Configured client id, or the MAC-derived default.
pub fn resolve_client_id(configured: Option<&str>) -> String {
    match configured {
        Some(id) => id.to_owned(),
        None => default_client_id(&read_mac()).as_str().to_owned(),
    }
}
