//! ITCHy USB identifiers.
//!
//! The firmware runs on a Teensy and reuses the PJRC raw HID vendor/product
//! pair. The vendor-defined usage page and usage tell the raw HID interface
//! apart from the keyboard/serial interfaces the same board exposes.

use serde::{Deserialize, Serialize};

/// PJRC vendor ID used by Teensy raw HID firmware.
pub const ITCHY_VENDOR_ID: u16 = 0x16C0;

/// Teensy raw HID product ID.
pub const ITCHY_PRODUCT_ID: u16 = 0x0486;

/// Vendor-defined usage page of the raw HID interface.
pub const ITCHY_USAGE_PAGE: u16 = 0xFFAB;

/// Usage of the raw HID interface.
pub const ITCHY_USAGE: u16 = 0x0200;

/// Size of every report in either direction.
pub const REPORT_LEN: usize = 64;

/// Identifies which HID interface to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier {
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage_page: u16,
    pub usage: u16,
}

impl DeviceIdentifier {
    pub const fn new(vendor_id: u16, product_id: u16, usage_page: u16, usage: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            usage_page,
            usage,
        }
    }

    /// Checks a candidate interface against this identifier.
    ///
    /// A candidate usage page or usage of `0` means the platform did not
    /// report it and is accepted.
    pub fn matches(&self, vendor_id: u16, product_id: u16, usage_page: u16, usage: u16) -> bool {
        self.vendor_id == vendor_id
            && self.product_id == product_id
            && (usage_page == 0 || usage_page == self.usage_page)
            && (usage == 0 || usage == self.usage)
    }
}

impl Default for DeviceIdentifier {
    fn default() -> Self {
        Self::new(
            ITCHY_VENDOR_ID,
            ITCHY_PRODUCT_ID,
            ITCHY_USAGE_PAGE,
            ITCHY_USAGE,
        )
    }
}

impl std::fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04X}:{:04X} (usage {:04X}:{:04X})",
            self.vendor_id, self.product_id, self.usage_page, self.usage
        )
    }
}
