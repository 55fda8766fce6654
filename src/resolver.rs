//! Resolving a characteristic's declared dependencies through a connection
//! before decoding it.

use crate::bleuuid::BluetoothUuid;
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::translate::Translator;
use crate::types::CharacteristicData;
use log::warn;
use std::collections::HashSet;

/// A GATT client connection to one peer device.
///
/// This crate only consumes the interface; the BLE transport behind it is the
/// caller's choice.
pub trait Connection {
    /// Reads the current value of a characteristic.
    fn read(&self, uuid: BluetoothUuid) -> Result<Vec<u8>, GattError>;

    /// Writes a characteristic value.
    fn write(&self, uuid: BluetoothUuid, data: &[u8]) -> Result<(), GattError>;

    /// Subscribes to notifications of a characteristic, returning a handle
    /// that can be passed to [`Connection::unsubscribe`].
    fn subscribe(
        &self,
        uuid: BluetoothUuid,
        callback: Box<dyn FnMut(&[u8]) + Send>,
    ) -> Result<SubscriptionHandle, GattError>;

    fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<(), GattError>;
}

/// An opaque token identifying one subscription on a connection.
pub type SubscriptionHandle = u64;

/// Reads characteristics through a [`Connection`], fetching each one's
/// declared dependencies first so its decoder has the context it needs.
pub struct Resolver<'a> {
    translator: &'a Translator,
}

impl<'a> Resolver<'a> {
    pub fn new(translator: &'a Translator) -> Self {
        Self { translator }
    }

    /// Reads and parses a characteristic, resolving its dependencies first.
    ///
    /// Required dependencies that cannot be read or that form a cycle fail
    /// the parse; optional dependencies are collected best-effort.
    pub fn read_and_parse(
        &self,
        connection: &dyn Connection,
        uuid: BluetoothUuid,
    ) -> CharacteristicData {
        let mut visited = HashSet::new();
        visited.insert(uuid);
        self.read_and_parse_inner(connection, uuid, &mut visited)
    }

    fn read_and_parse_inner(
        &self,
        connection: &dyn Connection,
        uuid: BluetoothUuid,
        visited: &mut HashSet<BluetoothUuid>,
    ) -> CharacteristicData {
        let name = self
            .translator
            .resolve(uuid)
            .map(|spec| spec.name)
            .unwrap_or_default();
        let data = match connection.read(uuid) {
            Ok(data) => data,
            Err(error) => {
                return CharacteristicData::failure(uuid, &name, &[], error);
            }
        };
        match self.build_context(connection, uuid, visited) {
            Ok(context) => self.translator.parse_with_context(uuid, &data, &context),
            Err(error) => CharacteristicData::failure(uuid, &name, &data, error),
        }
    }

    fn build_context(
        &self,
        connection: &dyn Connection,
        uuid: BluetoothUuid,
        visited: &mut HashSet<BluetoothUuid>,
    ) -> Result<CharacteristicContext, GattError> {
        let mut context = CharacteristicContext::new();
        let Some(codec) = self.translator.registry().resolve_codec(uuid) else {
            return Ok(context);
        };

        for dependency in codec.required_dependencies() {
            if !visited.insert(dependency) {
                return Err(GattError::DependencyCycle(dependency));
            }
            if connection.read(dependency).is_err() {
                return Err(GattError::MissingDependency(dependency));
            }
            let parsed = self.read_and_parse_inner(connection, dependency, visited);
            if let Some(GattError::DependencyCycle(inner)) = &parsed.error {
                return Err(GattError::DependencyCycle(*inner));
            }
            context.insert_peer(parsed);
        }
        for dependency in codec.optional_dependencies() {
            if !visited.insert(dependency) {
                warn!("{}", GattError::DependencyCycle(dependency));
                continue;
            }
            match connection.read(dependency) {
                Ok(_) => {
                    let parsed = self.read_and_parse_inner(connection, dependency, visited);
                    context.insert_peer(parsed);
                }
                Err(error) => {
                    warn!("Skipping optional dependency {dependency}: {error}");
                }
            }
        }
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characteristic::glucose::GLUCOSE_MEASUREMENT_UUID;
    use crate::codec::{CharacteristicCodec, Constraints};
    use crate::types::{Value, ValueType};
    use std::collections::HashMap;

    struct FakeConnection {
        values: HashMap<BluetoothUuid, Vec<u8>>,
    }

    impl FakeConnection {
        fn new(values: impl IntoIterator<Item = (BluetoothUuid, Vec<u8>)>) -> Self {
            Self {
                values: values.into_iter().collect(),
            }
        }
    }

    impl Connection for FakeConnection {
        fn read(&self, uuid: BluetoothUuid) -> Result<Vec<u8>, GattError> {
            self.values
                .get(&uuid)
                .cloned()
                .ok_or_else(|| GattError::Connection(format!("no value for {uuid}")))
        }

        fn write(&self, _: BluetoothUuid, _: &[u8]) -> Result<(), GattError> {
            Ok(())
        }

        fn subscribe(
            &self,
            _: BluetoothUuid,
            _: Box<dyn FnMut(&[u8]) + Send>,
        ) -> Result<SubscriptionHandle, GattError> {
            Ok(0)
        }

        fn unsubscribe(&self, _: SubscriptionHandle) -> Result<(), GattError> {
            Ok(())
        }
    }

    fn glucose_measurement_bytes(sequence_number: u16) -> Vec<u8> {
        let mut data = vec![0x10];
        data.extend_from_slice(&sequence_number.to_le_bytes());
        // Base time 2024-03-01 12:30:05.
        data.extend_from_slice(&[0xe8, 0x07, 0x03, 0x01, 0x0c, 0x1e, 0x05]);
        data
    }

    #[test]
    fn resolves_required_dependency() {
        let translator = Translator::new();
        let resolver = Resolver::new(&translator);
        let context_uuid = BluetoothUuid::from_u16(0x2a34);
        let connection = FakeConnection::new([
            (GLUCOSE_MEASUREMENT_UUID, glucose_measurement_bytes(7)),
            // Context with matching sequence number 7.
            (context_uuid, vec![0x00, 0x07, 0x00]),
        ]);
        let data = resolver.read_and_parse(&connection, context_uuid);
        assert!(data.ok(), "{:?}", data.error);
        assert!(matches!(data.value, Some(Value::GlucoseContext(_))));
    }

    #[test]
    fn missing_required_dependency() {
        let translator = Translator::new();
        let resolver = Resolver::new(&translator);
        let context_uuid = BluetoothUuid::from_u16(0x2a34);
        let connection = FakeConnection::new([(context_uuid, vec![0x00, 0x07, 0x00])]);
        let data = resolver.read_and_parse(&connection, context_uuid);
        assert_eq!(
            data.error,
            Some(GattError::MissingDependency(GLUCOSE_MEASUREMENT_UUID))
        );
        assert_eq!(data.raw_data, vec![0x00, 0x07, 0x00]);
    }

    #[test]
    fn mismatched_dependency_sequence_number() {
        let translator = Translator::new();
        let resolver = Resolver::new(&translator);
        let context_uuid = BluetoothUuid::from_u16(0x2a34);
        let connection = FakeConnection::new([
            (GLUCOSE_MEASUREMENT_UUID, glucose_measurement_bytes(8)),
            (context_uuid, vec![0x00, 0x07, 0x00]),
        ]);
        let data = resolver.read_and_parse(&connection, context_uuid);
        assert!(matches!(data.error, Some(GattError::ContextMismatch(_))));
    }

    struct CyclicCodec {
        uuid: BluetoothUuid,
        dependency: BluetoothUuid,
    }

    impl CharacteristicCodec for CyclicCodec {
        fn uuid(&self) -> BluetoothUuid {
            self.uuid
        }

        fn name(&self) -> &str {
            "Cyclic"
        }

        fn constraints(&self) -> Constraints {
            Constraints::exact(1).typed(ValueType::Numeric)
        }

        fn decode(
            &self,
            data: &[u8],
            _: &CharacteristicContext,
        ) -> Result<Value, GattError> {
            Ok(Value::Unsigned(data[0].into()))
        }

        fn encode(&self, _: &Value) -> Result<Vec<u8>, GattError> {
            Ok(vec![])
        }

        fn required_dependencies(&self) -> Vec<BluetoothUuid> {
            vec![self.dependency]
        }
    }

    #[test]
    fn dependency_cycle_is_detected() {
        let translator = Translator::new();
        let first = BluetoothUuid::parse("0000f001-0000-1000-8000-00805f9b34fb").unwrap();
        let second = BluetoothUuid::parse("0000f002-0000-1000-8000-00805f9b34fb").unwrap();
        translator
            .register_custom(std::sync::Arc::new(CyclicCodec {
                uuid: first,
                dependency: second,
            }))
            .unwrap();
        translator
            .register_custom(std::sync::Arc::new(CyclicCodec {
                uuid: second,
                dependency: first,
            }))
            .unwrap();
        let resolver = Resolver::new(&translator);
        let connection =
            FakeConnection::new([(first, vec![0x01]), (second, vec![0x02])]);
        let data = resolver.read_and_parse(&connection, first);
        assert_eq!(data.error, Some(GattError::DependencyCycle(first)));
    }
}
