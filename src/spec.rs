//! Immutable records describing entries in the Bluetooth SIG assigned-numbers
//! registry.
//!
//! These are built once when the relevant registry category is first loaded
//! and never mutated afterwards, so they can be shared freely across threads.

use crate::bleuuid::BluetoothUuid;
use crate::types::ValueType;

/// The wire type of one field in a characteristic's declared layout.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldType {
    UInt8,
    UInt16,
    UInt24,
    UInt32,
    SInt8,
    SInt16,
    SInt24,
    SInt32,
    /// IEEE-11073 16-bit SFLOAT.
    Sfloat,
    /// IEEE-11073 32-bit FLOAT.
    Float32,
    Utf8,
    Utf16,
    Boolean,
}

impl FieldType {
    /// Parses a type name as used in the GATT specification supplement YAML.
    pub(crate) fn from_yaml(name: &str) -> Option<Self> {
        match name {
            "uint8" => Some(Self::UInt8),
            "uint16" => Some(Self::UInt16),
            "uint24" => Some(Self::UInt24),
            "uint32" => Some(Self::UInt32),
            "sint8" => Some(Self::SInt8),
            "sint16" => Some(Self::SInt16),
            "sint24" => Some(Self::SInt24),
            "sint32" => Some(Self::SInt32),
            "sfloat" => Some(Self::Sfloat),
            "float32" => Some(Self::Float32),
            "utf8s" => Some(Self::Utf8),
            "utf16s" => Some(Self::Utf16),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// The fixed size of the type in bytes, or `None` for variable-length types.
    pub fn size(self) -> Option<usize> {
        match self {
            Self::UInt8 | Self::SInt8 | Self::Boolean => Some(1),
            Self::UInt16 | Self::SInt16 | Self::Sfloat => Some(2),
            Self::UInt24 | Self::SInt24 => Some(3),
            Self::UInt32 | Self::SInt32 | Self::Float32 => Some(4),
            Self::Utf8 | Self::Utf16 => None,
        }
    }

    /// Whether values of this type carry a sign.
    pub fn signed(self) -> bool {
        matches!(
            self,
            Self::SInt8 | Self::SInt16 | Self::SInt24 | Self::SInt32 | Self::Sfloat | Self::Float32
        )
    }
}

/// One field of a characteristic's declared layout, from the GATT
/// specification supplement ("gss") YAML.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    /// The field's name as given in the YAML, e.g. "Heart Rate Measurement Value".
    pub name: String,
    pub data_type: FieldType,
    /// Size in bytes; 0 for variable-length fields.
    pub size_bytes: usize,
    /// Unit identifier, e.g. "org.bluetooth.unit.percentage".
    pub unit_id: Option<String>,
    /// Multiplier applied to the raw value, e.g. 0.01.
    pub resolution: Option<f64>,
    /// Constant added after scaling.
    pub offset: Option<f64>,
    /// Whether the field may be absent from the value.
    pub optional: bool,
    /// Declared minimum of the decoded value.
    pub min_value: Option<f64>,
    /// Declared maximum of the decoded value.
    pub max_value: Option<f64>,
}

/// The registry's description of a single characteristic.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacteristicSpec {
    pub uuid: BluetoothUuid,
    /// Canonical SIG name, e.g. "Heart Rate Measurement".
    pub name: String,
    /// Reverse-DNS identifier, e.g. "org.bluetooth.characteristic.heart_rate_measurement".
    pub id: String,
    /// Declared field layout, in wire order. Empty when no specification
    /// supplement entry is vendored for this characteristic.
    pub fields: Vec<FieldSpec>,
    /// Semantic category of the decoded value.
    pub value_type: ValueType,
    /// Descriptors the characteristic is required to carry.
    pub required_descriptors: Vec<BluetoothUuid>,
}

/// The registry's description of a single service.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceSpec {
    pub uuid: BluetoothUuid,
    /// Canonical SIG name, e.g. "Heart Rate".
    pub name: String,
    /// Reverse-DNS identifier, e.g. "org.bluetooth.service.heart_rate".
    pub id: String,
    /// Characteristics a conforming server must expose in this service.
    pub mandatory_characteristics: Vec<BluetoothUuid>,
    /// Characteristics the service may expose.
    pub optional_characteristics: Vec<BluetoothUuid>,
}

/// The registry's description of a single descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct DescriptorSpec {
    pub uuid: BluetoothUuid,
    /// Canonical SIG name, e.g. "Client Characteristic Configuration".
    pub name: String,
    /// Reverse-DNS identifier.
    pub id: String,
}

/// The registry's description of a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSpec {
    pub uuid: BluetoothUuid,
    /// Full SIG name, e.g. "percentage".
    pub name: String,
    /// Reverse-DNS identifier, e.g. "org.bluetooth.unit.percentage".
    pub id: String,
    /// Display symbol, e.g. "%". Empty when the unit has no conventional symbol.
    pub symbol: String,
}

/// A plain `{uuid, name, id}` assigned-number entry.
///
/// Used for the registry categories whose SIG data carries no further
/// structure: declarations, SIG members, object types, mesh profiles and
/// service classes.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignedNumber {
    pub uuid: BluetoothUuid,
    pub name: String,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_sizes() {
        assert_eq!(FieldType::UInt8.size(), Some(1));
        assert_eq!(FieldType::SInt24.size(), Some(3));
        assert_eq!(FieldType::Float32.size(), Some(4));
        assert_eq!(FieldType::Utf8.size(), None);
    }

    #[test]
    fn field_type_from_yaml() {
        assert_eq!(FieldType::from_yaml("uint16"), Some(FieldType::UInt16));
        assert_eq!(FieldType::from_yaml("utf8s"), Some(FieldType::Utf8));
        assert_eq!(FieldType::from_yaml("struct"), None);
    }
}
