//! A library for decoding and encoding Bluetooth GATT characteristic values,
//! backed by a registry of Bluetooth SIG assigned numbers.
//!
//! Given the raw bytes of a characteristic value and its UUID, the
//! [`Translator`] resolves the characteristic, decodes the bytes into a typed
//! [`Value`] with its display unit, and validates it against the
//! characteristic's declared constraints. The inverse [`Translator::encode`]
//! produces bytes for a write. Applications with vendor-specific
//! characteristics register their own [`CharacteristicCodec`]s alongside the
//! standard ones.
//!
//! ```
//! use btsig::{BluetoothUuid, Translator, Value};
//!
//! let translator = Translator::instance();
//! let battery_level = BluetoothUuid::from_u16(0x2a19);
//! let data = translator.parse(battery_level, &[0x55]);
//! assert_eq!(data.value, Some(Value::Unsigned(85)));
//! assert_eq!(data.unit, "%");
//! assert_eq!(translator.encode(battery_level, &Value::Unsigned(85)).unwrap(), [0x55]);
//! ```

mod assigned;
mod bleuuid;
pub mod characteristic;
mod codec;
mod context;
pub mod descriptor;
mod error;
mod registry;
mod resolver;
mod spec;
pub mod template;
mod translate;
mod types;

pub use self::codec::{CharacteristicCodec, Constraints};
pub use self::context::{CharacteristicContext, DeviceHints};
pub use self::descriptor::DescriptorValue;
pub use self::error::GattError;
pub use self::registry::RegistryIndex;
pub use self::resolver::{Connection, Resolver, SubscriptionHandle};
pub use self::spec::{
    AssignedNumber, CharacteristicSpec, DescriptorSpec, FieldSpec, FieldType, ServiceSpec,
    UnitSpec,
};
pub use self::translate::Translator;
pub use self::types::{CharacteristicData, EnumValue, Value, ValueType};
pub use self::bleuuid::{BluetoothUuid, InvalidUuid};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_temperature_scenario() {
        let translator = Translator::new();
        let temperature = BluetoothUuid::parse("2A6E").unwrap();
        let data = translator.parse(temperature, &[0x76, 0x09]);
        assert_eq!(data.value, Some(Value::Float(24.22)));
        assert_eq!(data.unit, "°C");

        let data = translator.parse(temperature, &[0x00, 0x80]);
        assert!(data.ok());
        assert_eq!(data.value, Some(Value::NotPresent));
    }

    #[test]
    fn parse_heart_rate_scenario() {
        let translator = Translator::new();
        let data = translator.parse(
            BluetoothUuid::from_u16(0x2a37),
            &[0x10, 0x48, 0x01, 0x00, 0xd0, 0x07, 0xa0, 0x0f],
        );
        assert!(data.ok());
        let Some(Value::HeartRate(measurement)) = data.value else {
            panic!("unexpected value");
        };
        assert_eq!(measurement.heart_rate, 72);
        assert_eq!(
            measurement.rr_intervals,
            vec![1.0 / 1024.0, 2000.0 / 1024.0, 4000.0 / 1024.0]
        );
    }

    #[test]
    fn parse_glucose_feature_scenario() {
        let translator = Translator::new();
        let glucose_feature = BluetoothUuid::from_u16(0x2a51);
        let data = translator.parse(glucose_feature, &[0x0f, 0x00]);
        let Some(Value::Features(features)) = &data.value else {
            panic!("unexpected value");
        };
        assert_eq!(features.raw, 0x000f);
        assert_eq!(features.capabilities.len(), 4);
        assert_eq!(
            translator
                .encode(glucose_feature, data.value.as_ref().unwrap())
                .unwrap(),
            vec![0x0f, 0x00]
        );
    }

    #[test]
    fn parse_appearance_scenario() {
        let translator = Translator::new();
        let appearance = BluetoothUuid::from_u16(0x2a01);
        let data = translator.parse(appearance, &[0x41, 0x03]);
        let Some(Value::Appearance(value)) = &data.value else {
            panic!("unexpected value");
        };
        assert_eq!(value.raw, 833);
        assert_eq!(value.to_string(), "Heart Rate Sensor: Heart Rate Belt");
        assert_eq!(
            translator.encode(appearance, &Value::Unsigned(833)).unwrap(),
            vec![0x41, 0x03]
        );
    }

    #[test]
    fn no_panics_on_arbitrary_input() {
        let translator = Translator::new();
        // A cheap xorshift keeps the fuzz deterministic.
        let mut state: u32 = 0x1234_5678;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };
        let uuids: Vec<BluetoothUuid> = translator
            .registry()
            .list_characteristics()
            .iter()
            .map(|spec| spec.uuid)
            .collect();
        for uuid in uuids {
            for _ in 0..8 {
                let length = (next() % 257) as usize;
                let data: Vec<u8> = (0..length).map(|_| next() as u8).collect();
                // Must return a result, never panic.
                let _ = translator.parse(uuid, &data);
            }
        }
    }
}
