//! Host → device command reports.
//!
//! Every command is a 64-byte report. Byte 0 is the [`OpCode`]; the payload
//! is packed immediately after it with no alignment padding.
//!
//! ```text
//! CalibrationData  [0x01][target_x f32][target_y f32]
//! SimulationData   [0x02][damping f32][mass f32][stiffness f32][update_rate u32]
//! SetColor         [0x03][r][g][b]
//! SaveConfig       [0x04]
//! Calibrate        [0x05]
//! ```

use crate::codec::{ReportBuilder, ReportParser};
use crate::{ProtocolError, ProtocolResult, REPORT_LEN};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Invalid = 0,
    CalibrationData = 1,
    SimulationData = 2,
    SetColor = 3,
    SaveConfig = 4,
    Calibrate = 5,
}

impl OpCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Invalid),
            1 => Some(Self::CalibrationData),
            2 => Some(Self::SimulationData),
            3 => Some(Self::SetColor),
            4 => Some(Self::SaveConfig),
            5 => Some(Self::Calibrate),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// RGB color of the status LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Parameters of the firmware's spring/damper simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Virtual mass in kg.
    pub mass: f32,
    /// Spring constant in N/m.
    pub stiffness: f32,
    /// Damping coefficient in N·s/m.
    pub damping: f32,
    /// Minimum interval between state reports in milliseconds.
    pub update_rate_ms: u32,
}

impl SimulationParameters {
    pub fn validate(&self) -> ProtocolResult<()> {
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(ProtocolError::InvalidParameters(format!(
                "mass must be positive, got {}",
                self.mass
            )));
        }
        if !self.stiffness.is_finite() || self.stiffness < 0.0 {
            return Err(ProtocolError::InvalidParameters(format!(
                "stiffness must be non-negative, got {}",
                self.stiffness
            )));
        }
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(ProtocolError::InvalidParameters(format!(
                "damping must be non-negative, got {}",
                self.damping
            )));
        }
        Ok(())
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            mass: 0.1,
            stiffness: 2000.0,
            damping: 30.0,
            update_rate_ms: 20,
        }
    }
}

/// A decoded or to-be-encoded command report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Calibration rectangle size in metres.
    CalibrationData { target: [f32; 2] },
    SimulationData(SimulationParameters),
    SetColor(Color),
    SaveConfig,
    Calibrate,
}

impl Command {
    pub fn opcode(&self) -> OpCode {
        match self {
            Self::CalibrationData { .. } => OpCode::CalibrationData,
            Self::SimulationData(_) => OpCode::SimulationData,
            Self::SetColor(_) => OpCode::SetColor,
            Self::SaveConfig => OpCode::SaveConfig,
            Self::Calibrate => OpCode::Calibrate,
        }
    }

    /// Encode into a zero-padded 64-byte report.
    pub fn encode(&self) -> [u8; REPORT_LEN] {
        let mut builder = ReportBuilder::new();
        // The largest payload is 17 bytes, far below the report size.
        let written = self.write_into(&mut builder);
        debug_assert!(written.is_ok());
        builder.build()
    }

    fn write_into(&self, builder: &mut ReportBuilder) -> ProtocolResult<()> {
        builder.write_u8(self.opcode().as_u8())?;
        match self {
            Self::CalibrationData { target } => {
                builder.write_vec2_f32(*target)?;
            }
            Self::SimulationData(params) => {
                builder
                    .write_f32_le(params.damping)?
                    .write_f32_le(params.mass)?
                    .write_f32_le(params.stiffness)?
                    .write_u32_le(params.update_rate_ms)?;
            }
            Self::SetColor(color) => {
                builder
                    .write_u8(color.r)?
                    .write_u8(color.g)?
                    .write_u8(color.b)?;
            }
            Self::SaveConfig | Self::Calibrate => {}
        }
        Ok(())
    }

    /// Decode a command report.
    ///
    /// Returns `Ok(None)` for the `Invalid` opcode, which the firmware ignores.
    pub fn decode(data: &[u8]) -> ProtocolResult<Option<Self>> {
        let mut parser = ReportParser::new(data);
        let raw = parser.read_u8()?;
        let opcode = OpCode::from_u8(raw).ok_or(ProtocolError::UnknownOpCode(raw))?;

        let command = match opcode {
            OpCode::Invalid => return Ok(None),
            OpCode::CalibrationData => Self::CalibrationData {
                target: parser.read_vec2_f32()?,
            },
            OpCode::SimulationData => {
                let damping = parser.read_f32_le()?;
                let mass = parser.read_f32_le()?;
                let stiffness = parser.read_f32_le()?;
                let update_rate_ms = parser.read_u32_le()?;
                Self::SimulationData(SimulationParameters {
                    mass,
                    stiffness,
                    damping,
                    update_rate_ms,
                })
            }
            OpCode::SetColor => Self::SetColor(Color::new(
                parser.read_u8()?,
                parser.read_u8()?,
                parser.read_u8()?,
            )),
            OpCode::SaveConfig => Self::SaveConfig,
            OpCode::Calibrate => Self::Calibrate,
        };
        Ok(Some(command))
    }
}
