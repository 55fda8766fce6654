//! Variable-length text codec for `utf8s` and `utf16s` characteristic values.

use crate::error::GattError;

/// The longest text value the codec will accept, in bytes.
pub const MAX_LENGTH: usize = 512;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TextEncoding {
    Utf8,
    /// UTF-16, little-endian code units.
    Utf16,
}

/// A variable-length string value.
///
/// Decoding is strict: bytes that are not valid in the declared encoding are
/// rejected rather than replaced. Trailing NUL padding, which some devices
/// append to fixed-size string slots, is dropped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TextTemplate {
    encoding: TextEncoding,
}

pub const UTF8: TextTemplate = TextTemplate::new(TextEncoding::Utf8);
pub const UTF16: TextTemplate = TextTemplate::new(TextEncoding::Utf16);

impl TextTemplate {
    pub const fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }

    pub fn decode(self, data: &[u8]) -> Result<String, GattError> {
        if data.len() > MAX_LENGTH {
            return Err(GattError::LengthOutOfBounds {
                length: data.len(),
                min: 0,
                max: MAX_LENGTH,
            });
        }
        match self.encoding {
            TextEncoding::Utf8 => {
                let end = data.len() - data.iter().rev().take_while(|&&b| b == 0).count();
                std::str::from_utf8(&data[..end])
                    .map(str::to_owned)
                    .map_err(|_| GattError::InvalidText)
            }
            TextEncoding::Utf16 => {
                if data.len() % 2 != 0 {
                    return Err(GattError::InvalidText);
                }
                let units: Vec<u16> = data
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes(pair.try_into().unwrap()))
                    .collect();
                let end = units.len() - units.iter().rev().take_while(|&&u| u == 0).count();
                String::from_utf16(&units[..end]).map_err(|_| GattError::InvalidText)
            }
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, GattError> {
        let encoded: Vec<u8> = match self.encoding {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf16 => text
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes())
                .collect(),
        };
        if encoded.len() > MAX_LENGTH {
            return Err(GattError::LengthOutOfBounds {
                length: encoded.len(),
                min: 0,
                max: MAX_LENGTH,
            });
        }
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_utf8() {
        assert_eq!(UTF8.decode(b"Polar H10").unwrap(), "Polar H10");
        assert_eq!(UTF8.decode(b"name\0\0\0").unwrap(), "name");
        assert_eq!(UTF8.decode(b"").unwrap(), "");
    }

    #[test]
    fn decode_utf8_invalid() {
        assert_eq!(UTF8.decode(&[0xff, 0xfe, 0x00]), Err(GattError::InvalidText));
    }

    #[test]
    fn decode_utf16() {
        assert_eq!(
            UTF16.decode(&[0x48, 0x00, 0x69, 0x00]).unwrap(),
            "Hi"
        );
        assert_eq!(UTF16.decode(&[0x48, 0x00, 0x00, 0x00]).unwrap(), "H");
    }

    #[test]
    fn decode_utf16_invalid() {
        // Odd length.
        assert_eq!(UTF16.decode(&[0x48, 0x00, 0x69]), Err(GattError::InvalidText));
        // Unpaired surrogate.
        assert_eq!(UTF16.decode(&[0x00, 0xd8]), Err(GattError::InvalidText));
    }

    #[test]
    fn length_cap() {
        let long = vec![b'a'; MAX_LENGTH + 1];
        assert_eq!(
            UTF8.decode(&long),
            Err(GattError::LengthOutOfBounds {
                length: MAX_LENGTH + 1,
                min: 0,
                max: MAX_LENGTH,
            })
        );
        assert!(UTF8.encode(&String::from_utf8(vec![b'a'; MAX_LENGTH]).unwrap()).is_ok());
    }

    #[test]
    fn round_trip() {
        for text in ["", "Polar H10", "37°C", "héllo"] {
            assert_eq!(UTF8.decode(&UTF8.encode(text).unwrap()).unwrap(), text);
            assert_eq!(UTF16.decode(&UTF16.encode(text).unwrap()).unwrap(), text);
        }
    }
}
