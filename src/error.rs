//! Errors reported while looking up, decoding or encoding characteristic values.

use crate::bleuuid::{BluetoothUuid, InvalidUuid};
use crate::types::ValueType;
use thiserror::Error;

/// An error looking up, decoding or encoding a GATT characteristic value.
///
/// Decode failures are carried on [`CharacteristicData`](crate::CharacteristicData)
/// rather than returned directly, so a caller always gets the raw bytes back
/// alongside the error.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GattError {
    /// A UUID string was not in 16-bit, 32-bit or 128-bit form.
    #[error(transparent)]
    InvalidUuid(#[from] InvalidUuid),
    /// The UUID is in neither the SIG registry nor the custom registry.
    #[error("UUID {0} not found in the registry")]
    UuidNotFound(BluetoothUuid),
    /// The value had the wrong number of bytes for a fixed-length characteristic.
    #[error("Wrong length {length}, expected {expected_length}")]
    WrongLength {
        length: usize,
        expected_length: usize,
    },
    /// The value length fell outside the declared bounds of a variable-length
    /// characteristic.
    #[error("Wrong length {length}, expected {min} to {max} bytes")]
    LengthOutOfBounds {
        length: usize,
        min: usize,
        max: usize,
    },
    /// A decoded numeric value fell outside the effective declared range.
    #[error("Value {value} out of range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
    /// The decoded value's category did not match the characteristic's declared type.
    #[error("Expected a {expected:?} value, got {actual:?}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },
    /// Reserved flag bits were set in a flag-driven characteristic.
    ///
    /// Decoding continues past this; it is only reported as a warning.
    #[error("Reserved flag bits {flags:#x} set")]
    ReservedFlags { flags: u32 },
    /// A raw value was not a known member of the characteristic's enumeration.
    #[error("Unknown enumeration value {value:#04x}")]
    UnknownEnumValue { value: u32 },
    /// Text bytes were not valid in the characteristic's declared encoding.
    #[error("Invalid text encoding")]
    InvalidText,
    /// A cross-characteristic consistency check failed.
    #[error("Cross-characteristic check failed: {0}")]
    ContextMismatch(String),
    /// A characteristic required by the one being parsed was unavailable.
    #[error("Required characteristic {0} unavailable")]
    MissingDependency(BluetoothUuid),
    /// Characteristic dependencies form a cycle.
    #[error("Dependency cycle involving {0}")]
    DependencyCycle(BluetoothUuid),
    /// A custom registration clashed with an existing entry that does not
    /// permit overriding.
    #[error("UUID {0} is already registered and may not be overridden")]
    UuidConflict(BluetoothUuid),
    /// Reading a dependency through the connection failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// A codec failed in a way it should not be able to.
    #[error("Internal decoder error: {0}")]
    Internal(String),
}
