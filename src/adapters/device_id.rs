//! Device identity derived from the ESP32 factory MAC address.
//!
//! The ID has the form `SG-XXYYZZ` (last 3 MAC bytes, uppercase hex). It is
//! stable across reboots and is what the config service keys on
//! (`/config?deviceid=SG-XXYYZZ`).

use core::fmt::Write;

pub type DeviceIdString = heapless::String<16>;

pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(feature = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: the buffer is exactly the 6 bytes the call writes.
    unsafe {
        esp_idf_sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: a fixed MAC so host runs are reproducible.
#[cfg(not(feature = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    let _ = write!(id, "SG-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}
