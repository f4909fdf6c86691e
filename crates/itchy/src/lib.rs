//! Host library for the ITCHy tactile mouse
//!
//! [`Itchy`] owns the raw HID connection: it opens the device, sends the
//! configuration commands (LED color, simulation parameters, calibration)
//! and polls the state reports the firmware streams back. Connection
//! changes and link failures are reported through callbacks.
//!
//! [`TactileMouseQuery`] adapts a device to the [`PositionQuery`] interface
//! used by applications: `initialize`, then `update` once per frame and read
//! position, velocity, orientation and button state. In detached mode the
//! device is polled on a background thread and `update` only swaps in the
//! latest state.
//!
//! ```no_run
//! use itchy::{PositionQuery, QueryOptions, TactileMouseQuery};
//!
//! let mut query = TactileMouseQuery::with_hidapi(QueryOptions::default());
//! if query.initialize() {
//!     query.update();
//!     println!("velocity: {}", query.velocity());
//!     query.feedback(0, 255, 0);
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod callbacks;
pub mod config;
pub mod device;
pub mod query;
pub mod vector;

pub use callbacks::CallbackType;
pub use config::ItchyConfig;
pub use device::Itchy;
pub use query::{PositionQuery, QueryOptions, TactileMouseQuery};
pub use vector::Vec2;

pub use itchy_hid::{DeviceConnector, HidDeviceInfo, HidError, HidTransport};
pub use itchy_protocol::{Color, DeviceIdentifier, DeviceState, SimulationParameters};

use itchy_protocol::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ItchyError {
    #[error("Device not connected")]
    NotConnected,

    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceIdentifier),

    #[error("Device accepted 0 of {0} bytes")]
    ShortWrite(usize),

    #[error("HID error: {0}")]
    Hid(#[from] HidError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ItchyResult<T> = Result<T, ItchyError>;
