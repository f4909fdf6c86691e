//! Raw HID transport for the ITCHy tactile mouse
//!
//! This crate provides the blocking transport seam the device client talks
//! through, an `hidapi` backend for real hardware and in-memory mocks for
//! tests.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod device_info;
#[cfg(feature = "hidapi")]
pub mod hidapi_backend;
pub mod transport;

pub use device_info::*;
#[cfg(feature = "hidapi")]
pub use hidapi_backend::{HidApiConnector, HidApiTransport};
pub use transport::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HidError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open device: {0}")]
    OpenError(String),

    #[error("Failed to read from device: {0}")]
    ReadError(String),

    #[error("Failed to write to device: {0}")]
    WriteError(String),

    #[error("Invalid report format: {0}")]
    InvalidReport(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("HID backend error: {0}")]
    Backend(String),
}

pub type HidResult<T> = Result<T, HidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let err = HidError::DeviceNotFound("16C0:0486".to_string());
        assert_eq!(format!("{}", err), "Device not found: 16C0:0486");

        let err = HidError::Disconnected;
        assert_eq!(format!("{}", err), "Device disconnected");
    }
}
