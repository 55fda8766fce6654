//! Bluetooth UUIDs and their 16-bit and 32-bit short forms.
//!
//! The Bluetooth SIG assigns 16-bit and 32-bit UUIDs for standard services,
//! characteristics and descriptors. These are shorthand for full 128-bit UUIDs
//! constructed by inserting the short value into the Bluetooth Base UUID,
//! `00000000-0000-1000-8000-00805f9b34fb`.

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// The Bluetooth Base UUID, into which 16-bit and 32-bit assigned numbers are
/// inserted to form full 128-bit UUIDs.
const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Mask covering everything but the 32-bit assigned-number block of the base UUID.
const BLUETOOTH_BASE_MASK: u128 = 0x00000000_ffff_ffff_ffff_ffffffffffff;

/// An error parsing a [`BluetoothUuid`] from a string.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("Invalid Bluetooth UUID {0:?}")]
pub struct InvalidUuid(pub String);

/// A 128-bit Bluetooth UUID.
///
/// Values constructed from 16-bit or 32-bit assigned numbers compare equal to
/// the corresponding full UUID, so a `BluetoothUuid` can always be used as a
/// map key without worrying about which form it was parsed from.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BluetoothUuid(Uuid);

impl BluetoothUuid {
    /// Expands a 16-bit assigned number to a full UUID via the Bluetooth Base UUID.
    pub const fn from_u16(short: u16) -> Self {
        Self::from_u32(short as u32)
    }

    /// Expands a 32-bit assigned number to a full UUID via the Bluetooth Base UUID.
    pub const fn from_u32(short: u32) -> Self {
        Self(Uuid::from_u128(((short as u128) << 96) | BLUETOOTH_BASE_UUID))
    }

    /// Wraps a full 128-bit UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a UUID from a string.
    ///
    /// Accepts 4 hex digits (16-bit form), 8 hex digits (32-bit form), or 32
    /// hex digits with optional hyphens in the conventional 8-4-4-4-12
    /// positions. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, InvalidUuid> {
        let all_hex = s.bytes().all(|b| b.is_ascii_hexdigit());
        match s.len() {
            4 if all_hex => u16::from_str_radix(s, 16)
                .map(Self::from_u16)
                .map_err(|_| InvalidUuid(s.to_owned())),
            8 if all_hex => u32::from_str_radix(s, 16)
                .map(Self::from_u32)
                .map_err(|_| InvalidUuid(s.to_owned())),
            32 if all_hex => Ok(Self(
                Uuid::try_parse(s).map_err(|_| InvalidUuid(s.to_owned()))?,
            )),
            36 => {
                let hyphenated = s.bytes().enumerate().all(|(i, b)| match i {
                    8 | 13 | 18 | 23 => b == b'-',
                    _ => b.is_ascii_hexdigit(),
                });
                if hyphenated {
                    Ok(Self(
                        Uuid::try_parse(s).map_err(|_| InvalidUuid(s.to_owned()))?,
                    ))
                } else {
                    Err(InvalidUuid(s.to_owned()))
                }
            }
            _ => Err(InvalidUuid(s.to_owned())),
        }
    }

    /// Returns the 16-bit assigned number, if this UUID is a 16-bit short form
    /// expanded through the Bluetooth Base UUID.
    pub fn to_u16(self) -> Option<u16> {
        self.to_u32().and_then(|short| short.try_into().ok())
    }

    /// Returns the 32-bit assigned number, if this UUID is a short form
    /// expanded through the Bluetooth Base UUID.
    pub fn to_u32(self) -> Option<u32> {
        let value = self.0.as_u128();
        if value & BLUETOOTH_BASE_MASK == BLUETOOTH_BASE_UUID {
            Some((value >> 96) as u32)
        } else {
            None
        }
    }

    /// The underlying [`Uuid`].
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for BluetoothUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<BluetoothUuid> for Uuid {
    fn from(uuid: BluetoothUuid) -> Self {
        uuid.0
    }
}

impl FromStr for BluetoothUuid {
    type Err = InvalidUuid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for BluetoothUuid {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl Debug for BluetoothUuid {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_u16() {
        assert_eq!(
            BluetoothUuid::from_u16(0x2a19).to_string(),
            "00002a19-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn expand_u32() {
        assert_eq!(
            BluetoothUuid::from_u32(0x12345678).to_string(),
            "12345678-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn parse_short_forms() {
        assert_eq!(
            BluetoothUuid::parse("2A19").unwrap(),
            BluetoothUuid::from_u16(0x2a19)
        );
        assert_eq!(
            BluetoothUuid::parse("00002a19").unwrap(),
            BluetoothUuid::from_u16(0x2a19)
        );
    }

    #[test]
    fn parse_long_forms() {
        let expected = BluetoothUuid::from_u16(0x2a19);
        assert_eq!(
            BluetoothUuid::parse("00002a19-0000-1000-8000-00805f9b34fb").unwrap(),
            expected
        );
        assert_eq!(
            BluetoothUuid::parse("00002A19-0000-1000-8000-00805F9B34FB").unwrap(),
            expected
        );
        assert_eq!(
            BluetoothUuid::parse("00002a1900001000800000805f9b34fb").unwrap(),
            expected
        );
    }

    #[test]
    fn parse_invalid() {
        for s in [
            "",
            "2a1",
            "2a19f",
            "xyzw",
            "00002a19-0000-1000-8000-00805f9b34f",
            "00002a19_0000_1000_8000_00805f9b34fb",
            "{00002a19-0000-1000-8000-00805f9b34fb}",
        ] {
            assert_eq!(BluetoothUuid::parse(s), Err(InvalidUuid(s.to_owned())));
        }
    }

    #[test]
    fn short_form_recovery() {
        assert_eq!(BluetoothUuid::from_u16(0x180d).to_u16(), Some(0x180d));
        assert_eq!(BluetoothUuid::from_u32(0x12345678).to_u16(), None);
        assert_eq!(
            BluetoothUuid::from_u32(0x12345678).to_u32(),
            Some(0x12345678)
        );
        let custom =
            BluetoothUuid::parse("ebe0ccb0-7a0a-4b0c-8a1a-6ff2997da3a6").unwrap();
        assert_eq!(custom.to_u16(), None);
        assert_eq!(custom.to_u32(), None);
    }
}
