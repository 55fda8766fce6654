//! Decoded values of the descriptors that influence characteristic parsing.

use crate::bleuuid::BluetoothUuid;
use crate::error::GattError;
use crate::template::text;
use crate::template::Reader;

/// Characteristic Extended Properties.
pub const EXTENDED_PROPERTIES_UUID: BluetoothUuid = BluetoothUuid::from_u16(0x2900);
/// Characteristic User Description.
pub const USER_DESCRIPTION_UUID: BluetoothUuid = BluetoothUuid::from_u16(0x2901);
/// Client Characteristic Configuration.
pub const CLIENT_CONFIGURATION_UUID: BluetoothUuid = BluetoothUuid::from_u16(0x2902);
/// Characteristic Presentation Format.
pub const PRESENTATION_FORMAT_UUID: BluetoothUuid = BluetoothUuid::from_u16(0x2904);
/// Valid Range.
pub const VALID_RANGE_UUID: BluetoothUuid = BluetoothUuid::from_u16(0x2906);

/// A decoded descriptor value attached to the characteristic being parsed.
#[derive(Clone, Debug, PartialEq)]
pub enum DescriptorValue {
    /// Valid Range, already scaled into the parent characteristic's units.
    ValidRange { min: f64, max: f64 },
    /// Characteristic Presentation Format.
    PresentationFormat {
        format: u8,
        exponent: i8,
        unit: BluetoothUuid,
        namespace: u8,
        description: u16,
    },
    /// Client Characteristic Configuration bits.
    ClientConfiguration { notify: bool, indicate: bool },
    /// Characteristic User Description.
    UserDescription(String),
    /// Any other descriptor, undecoded.
    Raw(Vec<u8>),
}

impl DescriptorValue {
    /// Decodes a Client Characteristic Configuration value.
    pub fn decode_client_configuration(data: &[u8]) -> Result<Self, GattError> {
        if data.len() != 2 {
            return Err(GattError::WrongLength {
                length: data.len(),
                expected_length: 2,
            });
        }
        let bits = u16::from_le_bytes(data.try_into().unwrap());
        Ok(Self::ClientConfiguration {
            notify: bits & 0x0001 != 0,
            indicate: bits & 0x0002 != 0,
        })
    }

    /// Decodes a Characteristic Presentation Format value.
    pub fn decode_presentation_format(data: &[u8]) -> Result<Self, GattError> {
        if data.len() != 7 {
            return Err(GattError::WrongLength {
                length: data.len(),
                expected_length: 7,
            });
        }
        let mut reader = Reader::new(data);
        Ok(Self::PresentationFormat {
            format: reader.u8()?,
            exponent: reader.i8()?,
            unit: BluetoothUuid::from_u16(reader.u16()?),
            namespace: reader.u8()?,
            description: reader.u16()?,
        })
    }

    /// Decodes a Characteristic User Description value.
    pub fn decode_user_description(data: &[u8]) -> Result<Self, GattError> {
        Ok(Self::UserDescription(text::UTF8.decode(data)?))
    }
}
