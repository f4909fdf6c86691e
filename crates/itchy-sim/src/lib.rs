//! Software model of the ITCHy firmware
//!
//! [`VirtualDevice`] reproduces the firmware's mode machine, sensor
//! calibration and spring/damper rigid-body simulation. Wrapped in a
//! [`SimulatedConnector`] it stands in for the real hardware anywhere a
//! [`itchy_hid::DeviceConnector`] is accepted, which lets the client crates
//! and the CLI run end to end without a Teensy attached.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod body;
pub mod device;
pub mod math;
pub mod sensor;
pub mod store;
pub mod transport;

pub use body::RigidBody;
pub use device::{FirmwareMode, Led, VirtualDevice};
pub use sensor::{Sensor, SensorCalibration};
pub use store::{ConfigStore, StoredConfig};
pub use transport::{SimulatedConnector, SimulatedTransport};

use math::Vec2f;
use thiserror::Error;

/// Distance between the two optical sensors in metres.
pub const SENSOR_DISTANCE: f32 = 0.0756019;

/// Rest offset of the left sensor from the body centre in metres.
pub const SENSOR_LEFT_OFFSET: Vec2f = [-0.0124523, 0.0356911];

/// Rest offset of the right sensor from the body centre in metres.
pub const SENSOR_RIGHT_OFFSET: Vec2f = [0.0124523, -0.0356911];

/// Default calibration rectangle in metres.
pub const DEFAULT_CALIBRATION_TARGET: Vec2f = [0.1, 0.1];

/// Angle of the sensor bar at rest.
pub fn static_angle() -> f32 {
    SENSOR_LEFT_OFFSET[1].atan2(SENSOR_LEFT_OFFSET[0])
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] itchy_protocol::ProtocolError),

    #[error("Config store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
