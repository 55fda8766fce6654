//! Reusable leaf codecs that characteristic implementations are built from.
//!
//! Templates are stateless value types configured by constants. Each exposes a
//! `decode` taking a byte slice and an `encode` producing bytes. All multi-byte
//! values in the assigned-numbers set are little-endian.

pub mod enumeration;
pub mod ieee11073;
pub mod int;
pub mod scaled;
pub mod text;
pub mod time;
pub mod vector;

use crate::error::GattError;

/// A cursor over a characteristic value's bytes.
///
/// Flag-driven characteristics accumulate an offset as optional fields are
/// consumed; this keeps the bookkeeping and the truncation checks in one place.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], GattError> {
        let end = self.pos + count;
        if end > self.data.len() {
            return Err(GattError::WrongLength {
                length: self.data.len(),
                expected_length: end,
            });
        }
        let taken = &self.data[self.pos..end];
        self.pos = end;
        Ok(taken)
    }

    pub fn u8(&mut self) -> Result<u8, GattError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, GattError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn u24(&mut self) -> Result<u32, GattError> {
        let bytes = self.take(3)?;
        Ok(bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16)
    }

    pub fn u32(&mut self) -> Result<u32, GattError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn i8(&mut self) -> Result<i8, GattError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn i16(&mut self) -> Result<i16, GattError> {
        Ok(i16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn i24(&mut self) -> Result<i32, GattError> {
        let unsigned = self.u24()?;
        // Sign-extend from bit 23.
        Ok((unsigned as i32) << 8 >> 8)
    }

    pub fn i32(&mut self) -> Result<i32, GattError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Reads an IEEE-11073 16-bit SFLOAT.
    pub fn sfloat(&mut self) -> Result<ieee11073::MedicalFloat, GattError> {
        Ok(ieee11073::Sfloat::decode_raw(self.u16()?))
    }

    /// All bytes not yet consumed.
    pub fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Checks that the value has been consumed exactly.
    pub fn finish(self) -> Result<(), GattError> {
        if self.pos == self.data.len() {
            Ok(())
        } else {
            Err(GattError::WrongLength {
                length: self.data.len(),
                expected_length: self.pos,
            })
        }
    }
}

/// Rounds to the nearest integer, ties to even.
///
/// This is the canonical rounding for scaled encodes, so 0.5-resolution values
/// round-trip without drifting upwards.
pub(crate) fn round_half_even(value: f64) -> f64 {
    let truncated = value.trunc();
    if (value - truncated).abs() == 0.5 {
        if truncated % 2.0 == 0.0 {
            truncated
        } else {
            truncated + value.signum()
        }
    } else {
        value.round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_widths() {
        let mut reader = Reader::new(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0xff]);
        assert_eq!(reader.u8().unwrap(), 0x01);
        assert_eq!(reader.u16().unwrap(), 0x0302);
        assert_eq!(reader.u24().unwrap(), 0x060504);
        assert_eq!(reader.i8().unwrap(), -1);
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn reader_sign_extension() {
        let mut reader = Reader::new(&[0xff, 0xff, 0xff]);
        assert_eq!(reader.i24().unwrap(), -1);
        let mut reader = Reader::new(&[0x00, 0x00, 0x80]);
        assert_eq!(reader.i24().unwrap(), -0x80_0000);
    }

    #[test]
    fn reader_truncation() {
        let mut reader = Reader::new(&[0x01]);
        assert_eq!(
            reader.u16(),
            Err(GattError::WrongLength {
                length: 1,
                expected_length: 2
            })
        );
    }

    #[test]
    fn reader_trailing_bytes() {
        let mut reader = Reader::new(&[0x01, 0x02]);
        reader.u8().unwrap();
        assert_eq!(
            reader.finish(),
            Err(GattError::WrongLength {
                length: 2,
                expected_length: 1
            })
        );
    }

    #[test]
    fn round_ties_to_even() {
        assert_eq!(round_half_even(2.5), 2.0);
        assert_eq!(round_half_even(3.5), 4.0);
        assert_eq!(round_half_even(-2.5), -2.0);
        assert_eq!(round_half_even(-3.5), -4.0);
        assert_eq!(round_half_even(2.4), 2.0);
        assert_eq!(round_half_even(2.6), 3.0);
    }
}
