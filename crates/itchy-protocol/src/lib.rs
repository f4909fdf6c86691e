//! ITCHy raw HID protocol constants, command encoders and state decoding.
//!
//! The ITCHy is a two-sensor tactile mouse built around a Teensy board. It
//! enumerates as a raw HID device (vendor-defined usage page `0xFFAB`) and
//! exchanges fixed 64-byte reports in both directions:
//!
//! - Host → device: a command report. Byte 0 carries an [`OpCode`], the
//!   payload follows packed back to back with no alignment padding.
//! - Device → host: a [`DeviceState`] report emitted at the configured
//!   update rate while the firmware simulates the rigid body.
//!
//! All multi-byte values are little-endian. This crate performs no I/O.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod codec;
pub mod commands;
pub mod ids;
pub mod state;

pub use codec::{ReportBuilder, ReportParser};
pub use commands::{Color, Command, OpCode, SimulationParameters};
pub use ids::{
    DeviceIdentifier, ITCHY_PRODUCT_ID, ITCHY_USAGE, ITCHY_USAGE_PAGE, ITCHY_VENDOR_ID,
    REPORT_LEN,
};
pub use state::{DeviceState, STATE_PAYLOAD_LEN};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid report size: expected at least {expected}, got {actual}")]
    InvalidReportSize { expected: usize, actual: usize },

    #[error("Unknown opcode: {0:#04x}")]
    UnknownOpCode(u8),

    #[error("Unexpected end of report at offset {0}")]
    UnexpectedEnd(usize),

    #[error("Report overflow: {0} bytes do not fit into a report")]
    Overflow(usize),

    #[error("Invalid simulation parameters: {0}")]
    InvalidParameters(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::InvalidReportSize {
            expected: 60,
            actual: 8,
        };
        assert_eq!(
            format!("{}", err),
            "Invalid report size: expected at least 60, got 8"
        );

        let err = ProtocolError::UnknownOpCode(0x2A);
        assert_eq!(format!("{}", err), "Unknown opcode: 0x2a");
    }
}
