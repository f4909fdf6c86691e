//! Little-endian cursor helpers for fixed-size reports

use crate::{ProtocolError, ProtocolResult, REPORT_LEN};

/// Reads little-endian values from a report.
pub struct ReportParser<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ReportParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    fn take<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let end = self
            .position
            .checked_add(N)
            .ok_or(ProtocolError::UnexpectedEnd(self.position))?;
        let bytes = self
            .buffer
            .get(self.position..end)
            .ok_or(ProtocolError::UnexpectedEnd(self.position))?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.position = end;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> ProtocolResult<u8> {
        let [b] = self.take::<1>()?;
        Ok(b)
    }

    pub fn read_i16_le(&mut self) -> ProtocolResult<i16> {
        Ok(i16::from_le_bytes(self.take::<2>()?))
    }

    pub fn read_u32_le(&mut self) -> ProtocolResult<u32> {
        Ok(u32::from_le_bytes(self.take::<4>()?))
    }

    pub fn read_f32_le(&mut self) -> ProtocolResult<f32> {
        Ok(f32::from_le_bytes(self.take::<4>()?))
    }

    pub fn read_vec2_f32(&mut self) -> ProtocolResult<[f32; 2]> {
        Ok([self.read_f32_le()?, self.read_f32_le()?])
    }

    pub fn read_vec2_i16(&mut self) -> ProtocolResult<[i16; 2]> {
        Ok([self.read_i16_le()?, self.read_i16_le()?])
    }

    pub fn skip(&mut self, count: usize) {
        self.position = self.position.saturating_add(count).min(self.buffer.len());
    }
}

/// Writes little-endian values into a zero-padded 64-byte report.
pub struct ReportBuilder {
    buffer: [u8; REPORT_LEN],
    position: usize,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            buffer: [0u8; REPORT_LEN],
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn put(&mut self, bytes: &[u8]) -> ProtocolResult<&mut Self> {
        let end = self
            .position
            .checked_add(bytes.len())
            .filter(|end| *end <= REPORT_LEN)
            .ok_or(ProtocolError::Overflow(self.position.saturating_add(bytes.len())))?;
        if let Some(slot) = self.buffer.get_mut(self.position..end) {
            slot.copy_from_slice(bytes);
        }
        self.position = end;
        Ok(self)
    }

    pub fn write_u8(&mut self, value: u8) -> ProtocolResult<&mut Self> {
        self.put(&[value])
    }

    pub fn write_i16_le(&mut self, value: i16) -> ProtocolResult<&mut Self> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_u32_le(&mut self, value: u32) -> ProtocolResult<&mut Self> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_f32_le(&mut self, value: f32) -> ProtocolResult<&mut Self> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_vec2_f32(&mut self, value: [f32; 2]) -> ProtocolResult<&mut Self> {
        self.write_f32_le(value[0])?.write_f32_le(value[1])
    }

    pub fn write_vec2_i16(&mut self, value: [i16; 2]) -> ProtocolResult<&mut Self> {
        self.write_i16_le(value[0])?.write_i16_le(value[1])
    }

    /// Zero padding up to `offset`.
    pub fn pad_to(&mut self, offset: usize) -> ProtocolResult<&mut Self> {
        if offset > REPORT_LEN {
            return Err(ProtocolError::Overflow(offset));
        }
        self.position = self.position.max(offset);
        Ok(self)
    }

    pub fn build(self) -> [u8; REPORT_LEN] {
        self.buffer
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
