//! Sensor address normalisation.
//!
//! Configuration carries the address the way it is printed on the sensor,
//! most significant byte first (`C8:AE:54:01:AC:A9`).  The transport wants
//! the six raw bytes least significant first.

use core::fmt::Write;

use crate::app::ports::BleAddress;
use crate::error::ConfigError;

/// Parse `AA:BB:CC:DD:EE:FF` into transport byte order.
pub fn parse_address(text: &str) -> Result<BleAddress, ConfigError> {
    let mut out: BleAddress = [0u8; 6];
    let mut parts = text.split(':');
    // Fill from the back: the first printed octet is the most significant.
    for slot in out.iter_mut().rev() {
        let part = parts.next().ok_or(ConfigError::Invalid("sensor address too short"))?;
        if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ConfigError::Invalid("sensor address octet must be two hex digits"));
        }
        *slot = u8::from_str_radix(part, 16)
            .map_err(|_| ConfigError::Invalid("sensor address is not hex"))?;
    }
    if parts.next().is_some() {
        return Err(ConfigError::Invalid("sensor address too long"));
    }
    Ok(out)
}

/// Render transport byte order back to printed form, for logs.
pub fn format_address(addr: &BleAddress) -> heapless::String<17> {
    let mut s = heapless::String::new();
    let _ = write!(
        s,
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        addr[5], addr[4], addr[3], addr[2], addr[1], addr[0]
    );
    s
}
