//! Device → host state report.

use crate::codec::{ReportBuilder, ReportParser};
use crate::{ProtocolError, ProtocolResult, REPORT_LEN};
use serde::{Deserialize, Serialize};

/// Number of meaningful bytes at the start of a state report.
pub const STATE_PAYLOAD_LEN: usize = 60;

/// Offset of the first sensor field; bytes 25..28 are alignment padding.
const LEFT_SENSOR_OFFSET: usize = 28;

/// Snapshot of the simulated rigid body as reported by the firmware.
///
/// # Report layout
/// ```text
/// 0   position          [f32; 2]  m
/// 8   angle             f32       rad
/// 12  velocity          [f32; 2]  m/s
/// 20  angular_velocity  f32       rad/s
/// 24  button            u8
/// 28  left_sensor       [f32; 2]
/// 36  right_sensor      [f32; 2]
/// 44  left_increment    [i16; 2]  raw counts since the previous report
/// 48  right_increment   [i16; 2]
/// 52  time_step         f32       s
/// 56  time              f32       s
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceState {
    pub position: [f32; 2],
    pub angle: f32,
    pub velocity: [f32; 2],
    pub angular_velocity: f32,
    pub button: u8,
    pub left_sensor: [f32; 2],
    pub right_sensor: [f32; 2],
    pub left_increment: [i16; 2],
    pub right_increment: [i16; 2],
    pub time_step: f32,
    pub time: f32,
}

impl DeviceState {
    pub fn parse(data: &[u8]) -> ProtocolResult<Self> {
        if data.len() < STATE_PAYLOAD_LEN {
            return Err(ProtocolError::InvalidReportSize {
                expected: STATE_PAYLOAD_LEN,
                actual: data.len(),
            });
        }

        let mut parser = ReportParser::new(data);
        let position = parser.read_vec2_f32()?;
        let angle = parser.read_f32_le()?;
        let velocity = parser.read_vec2_f32()?;
        let angular_velocity = parser.read_f32_le()?;
        let button = parser.read_u8()?;
        parser.skip(LEFT_SENSOR_OFFSET - parser.position());
        let left_sensor = parser.read_vec2_f32()?;
        let right_sensor = parser.read_vec2_f32()?;
        let left_increment = parser.read_vec2_i16()?;
        let right_increment = parser.read_vec2_i16()?;
        let time_step = parser.read_f32_le()?;
        let time = parser.read_f32_le()?;

        Ok(Self {
            position,
            angle,
            velocity,
            angular_velocity,
            button,
            left_sensor,
            right_sensor,
            left_increment,
            right_increment,
            time_step,
            time,
        })
    }

    pub fn encode(&self) -> [u8; REPORT_LEN] {
        let mut builder = ReportBuilder::new();
        let written = self.write_into(&mut builder);
        debug_assert!(written.is_ok());
        builder.build()
    }

    fn write_into(&self, builder: &mut ReportBuilder) -> ProtocolResult<()> {
        builder
            .write_vec2_f32(self.position)?
            .write_f32_le(self.angle)?
            .write_vec2_f32(self.velocity)?
            .write_f32_le(self.angular_velocity)?
            .write_u8(self.button)?
            .pad_to(LEFT_SENSOR_OFFSET)?
            .write_vec2_f32(self.left_sensor)?
            .write_vec2_f32(self.right_sensor)?
            .write_vec2_i16(self.left_increment)?
            .write_vec2_i16(self.right_increment)?
            .write_f32_le(self.time_step)?
            .write_f32_le(self.time)?;
        Ok(())
    }

    pub fn button_pressed(&self) -> bool {
        self.button == 1
    }
}
