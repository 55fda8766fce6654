//! Read-only context available to a decoder during a single parse.

use crate::bleuuid::BluetoothUuid;
use crate::descriptor::{DescriptorValue, VALID_RANGE_UUID};
use crate::types::CharacteristicData;
use std::collections::HashMap;

/// Hints about the peer device that a few vendor-specific codecs consult.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeviceHints {
    /// Set when the device is known to send multi-byte values big-endian,
    /// against the GATT convention.
    pub big_endian: bool,
    /// Manufacturer name, when known.
    pub vendor: Option<String>,
}

/// Sibling values and descriptors available while decoding one characteristic.
///
/// A context is built per parse invocation and never shared across threads.
/// Decoders read it but never modify it; a decoder that needs an absent peer
/// either falls back to a default or fails with `MissingDependency`.
#[derive(Clone, Debug, Default)]
pub struct CharacteristicContext {
    peers: HashMap<BluetoothUuid, CharacteristicData>,
    peer_names: HashMap<String, BluetoothUuid>,
    descriptors: HashMap<BluetoothUuid, DescriptorValue>,
    hints: DeviceHints,
}

impl CharacteristicContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the parsed value of a sibling characteristic.
    pub fn insert_peer(&mut self, data: CharacteristicData) {
        if !data.name.is_empty() {
            self.peer_names.insert(data.name.to_lowercase(), data.uuid);
        }
        self.peers.insert(data.uuid, data);
    }

    /// Adds a decoded descriptor of the characteristic being parsed.
    pub fn insert_descriptor(&mut self, uuid: BluetoothUuid, value: DescriptorValue) {
        self.descriptors.insert(uuid, value);
    }

    pub fn set_hints(&mut self, hints: DeviceHints) {
        self.hints = hints;
    }

    /// The parsed value of a sibling characteristic, if available.
    pub fn peer(&self, uuid: BluetoothUuid) -> Option<&CharacteristicData> {
        self.peers.get(&uuid)
    }

    /// Looks up a sibling by its canonical name, case-insensitively.
    pub fn peer_by_name(&self, name: &str) -> Option<&CharacteristicData> {
        let uuid = self.peer_names.get(&name.to_lowercase())?;
        self.peers.get(uuid)
    }

    pub fn descriptor(&self, uuid: BluetoothUuid) -> Option<&DescriptorValue> {
        self.descriptors.get(&uuid)
    }

    /// The range declared by a Valid Range descriptor, if one is attached.
    pub fn valid_range(&self) -> Option<(f64, f64)> {
        match self.descriptors.get(&VALID_RANGE_UUID) {
            Some(&DescriptorValue::ValidRange { min, max }) => Some((min, max)),
            _ => None,
        }
    }

    pub fn hints(&self) -> &DeviceHints {
        &self.hints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn battery_level() -> CharacteristicData {
        CharacteristicData::success(
            BluetoothUuid::from_u16(0x2a19),
            "Battery Level",
            Value::Unsigned(85),
            "%",
            &[0x55],
        )
    }

    #[test]
    fn peer_lookup() {
        let mut context = CharacteristicContext::new();
        context.insert_peer(battery_level());
        let uuid = BluetoothUuid::from_u16(0x2a19);
        assert_eq!(context.peer(uuid).unwrap().value, Some(Value::Unsigned(85)));
        assert!(context.peer(BluetoothUuid::from_u16(0x2a37)).is_none());
    }

    #[test]
    fn peer_lookup_by_name() {
        let mut context = CharacteristicContext::new();
        context.insert_peer(battery_level());
        assert!(context.peer_by_name("battery level").is_some());
        assert!(context.peer_by_name("Battery Level").is_some());
        assert!(context.peer_by_name("Heart Rate Measurement").is_none());
    }

    #[test]
    fn valid_range() {
        let mut context = CharacteristicContext::new();
        assert_eq!(context.valid_range(), None);
        context.insert_descriptor(
            VALID_RANGE_UUID,
            DescriptorValue::ValidRange {
                min: 10.0,
                max: 20.0,
            },
        );
        assert_eq!(context.valid_range(), Some((10.0, 20.0)));
    }
}
