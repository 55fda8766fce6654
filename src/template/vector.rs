//! Fixed-component vector codec for multi-axis values sharing one scaling,
//! e.g. 2D and 3D magnetic flux density.

use crate::error::GattError;
use crate::template::scaled::ScaledTemplate;
use crate::template::Reader;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VectorTemplate {
    component: ScaledTemplate,
    components: usize,
}

impl VectorTemplate {
    pub const fn new(component: ScaledTemplate, components: usize) -> Self {
        Self {
            component,
            components,
        }
    }

    pub fn decode(self, data: &[u8]) -> Result<Vec<f64>, GattError> {
        let expected = self.components * self.component.int().width();
        if data.len() != expected {
            return Err(GattError::WrongLength {
                length: data.len(),
                expected_length: expected,
            });
        }
        let mut reader = Reader::new(data);
        (0..self.components)
            .map(|_| self.component.read(&mut reader))
            .collect()
    }

    pub fn encode(self, components: &[f64]) -> Result<Vec<u8>, GattError> {
        if components.len() != self.components {
            return Err(GattError::WrongLength {
                length: components.len(),
                expected_length: self.components,
            });
        }
        let mut data = Vec::with_capacity(self.components * self.component.int().width());
        for &component in components {
            data.extend_from_slice(&self.component.encode(component)?);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::int::SINT16;

    const FLUX_3D: VectorTemplate = VectorTemplate::new(ScaledTemplate::new(SINT16, 1e-7), 3);

    #[test]
    fn decode_three_axes() {
        let decoded = FLUX_3D
            .decode(&[0x64, 0x00, 0x9c, 0xff, 0x00, 0x00])
            .unwrap();
        for (decoded, expected) in decoded.iter().zip([100e-7, -100e-7, 0.0]) {
            assert!((decoded - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn decode_wrong_length() {
        assert_eq!(
            FLUX_3D.decode(&[0x64, 0x00]),
            Err(GattError::WrongLength {
                length: 2,
                expected_length: 6
            })
        );
    }

    #[test]
    fn round_trip() {
        let components = vec![12e-7, -7e-7, 32000e-7];
        let encoded = FLUX_3D.encode(&components).unwrap();
        for (decoded, expected) in FLUX_3D.decode(&encoded).unwrap().iter().zip(&components) {
            assert!((decoded - expected).abs() < 1e-10);
        }
    }
}
