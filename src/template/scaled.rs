//! Scaled integer codec: a fixed-width integer with a resolution and offset.

use crate::error::GattError;
use crate::template::int::IntTemplate;
use crate::template::{round_half_even, Reader};

/// A fixed-width integer carrying a real value `raw * resolution + offset`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScaledTemplate {
    int: IntTemplate,
    resolution: f64,
    offset: f64,
}

impl ScaledTemplate {
    pub const fn new(int: IntTemplate, resolution: f64) -> Self {
        Self {
            int,
            resolution,
            offset: 0.0,
        }
    }

    pub const fn with_offset(int: IntTemplate, resolution: f64, offset: f64) -> Self {
        Self {
            int,
            resolution,
            offset,
        }
    }

    pub const fn int(self) -> IntTemplate {
        self.int
    }

    pub const fn resolution(self) -> f64 {
        self.resolution
    }

    pub const fn offset(self) -> f64 {
        self.offset
    }

    /// Whether decoded values are whole numbers on an unshifted scale.
    pub fn is_integer(self) -> bool {
        self.resolution == 1.0 && self.offset == 0.0
    }

    /// The smallest value the template can represent.
    pub fn min(self) -> f64 {
        self.int.min() as f64 * self.resolution + self.offset
    }

    /// The largest value the template can represent.
    pub fn max(self) -> f64 {
        self.int.max() as f64 * self.resolution + self.offset
    }

    pub fn scale(self, raw: i64) -> f64 {
        raw as f64 * self.resolution + self.offset
    }

    pub fn read(self, reader: &mut Reader) -> Result<f64, GattError> {
        Ok(self.scale(self.int.read(reader)?))
    }

    pub fn decode(self, data: &[u8]) -> Result<f64, GattError> {
        Ok(self.scale(self.int.decode(data)?))
    }

    /// Encodes a value, rounding ties to even.
    pub fn encode(self, value: f64) -> Result<Vec<u8>, GattError> {
        let raw = round_half_even((value - self.offset) / self.resolution);
        if !raw.is_finite() || raw < self.int.min() as f64 || raw > self.int.max() as f64 {
            return Err(GattError::OutOfRange {
                value,
                min: self.min(),
                max: self.max(),
            });
        }
        self.int.encode(raw as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::int::{SINT16, UINT16, UINT8};

    #[test]
    fn decode_scaled() {
        // Temperature, sint16 with resolution 0.01.
        let template = ScaledTemplate::new(SINT16, 0.01);
        assert_eq!(template.decode(&[0x76, 0x09]).unwrap(), 24.22);
        assert_eq!(template.decode(&[0x00, 0x80]).unwrap(), -327.68);
    }

    #[test]
    fn decode_with_offset() {
        let template = ScaledTemplate::with_offset(UINT8, 0.5, -64.0);
        assert_eq!(template.decode(&[0x00]).unwrap(), -64.0);
        assert_eq!(template.decode(&[0x80]).unwrap(), 0.0);
    }

    #[test]
    fn encode_rounds_ties_to_even() {
        let template = ScaledTemplate::new(UINT16, 0.1);
        // 1.25 / 0.1 = 12.5, which rounds to 12 rather than 13.
        assert_eq!(template.encode(1.25).unwrap(), vec![12, 0]);
        assert_eq!(template.encode(1.35).unwrap(), vec![14, 0]);
    }

    #[test]
    fn encode_out_of_range() {
        let template = ScaledTemplate::new(SINT16, 0.01);
        assert_eq!(
            template.encode(400.0),
            Err(GattError::OutOfRange {
                value: 400.0,
                min: -327.68,
                max: 327.67,
            })
        );
        assert!(matches!(
            template.encode(f64::NAN),
            Err(GattError::OutOfRange { .. })
        ));
    }

    #[test]
    fn round_trip_within_resolution() {
        let template = ScaledTemplate::new(SINT16, 0.01);
        let value = 24.22;
        let decoded = template.decode(&template.encode(value).unwrap()).unwrap();
        assert!((decoded - value).abs() < 0.01);
    }
}
