//! The translator: the crate's main entry point for looking up, parsing and
//! encoding characteristic values.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{encode_with, parse_with, CharacteristicCodec};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::registry::RegistryIndex;
use crate::spec::CharacteristicSpec;
use crate::types::{CharacteristicData, Value};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

lazy_static! {
    static ref INSTANCE: Translator = Translator::new();
}

/// Translates between raw characteristic bytes and typed values.
///
/// `parse`, `encode` and the lookups are stateless per call and safe to use
/// from any thread. Custom registrations and service bookkeeping serialize
/// through internal writer locks and become visible to all threads.
///
/// Most applications use the process-wide [`Translator::instance`]; tests
/// construct their own with [`Translator::new`] so custom registrations do
/// not leak between them.
pub struct Translator {
    registry: RegistryIndex,
    /// Service membership recorded by `process_services`: characteristic →
    /// sibling characteristics of the same service.
    siblings: RwLock<HashMap<BluetoothUuid, Vec<BluetoothUuid>>>,
}

impl Translator {
    pub fn new() -> Self {
        Self {
            registry: RegistryIndex::new(),
            siblings: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide shared instance.
    pub fn instance() -> &'static Translator {
        &INSTANCE
    }

    /// The underlying registry index.
    pub fn registry(&self) -> &RegistryIndex {
        &self.registry
    }

    /// Whether any codec, SIG or custom, can parse this UUID.
    pub fn supports(&self, uuid: BluetoothUuid) -> bool {
        self.registry.supports(uuid)
    }

    pub fn resolve(&self, uuid: BluetoothUuid) -> Option<CharacteristicSpec> {
        self.registry.resolve_characteristic(uuid)
    }

    pub fn resolve_by_name(&self, name: &str) -> Option<CharacteristicSpec> {
        self.registry.resolve_characteristic_by_name(name)
    }

    /// Parses a value with an empty context.
    pub fn parse(&self, uuid: BluetoothUuid, data: &[u8]) -> CharacteristicData {
        self.parse_with_context(uuid, data, &CharacteristicContext::new())
    }

    /// Parses a value with sibling values and descriptors available.
    pub fn parse_with_context(
        &self,
        uuid: BluetoothUuid,
        data: &[u8],
        context: &CharacteristicContext,
    ) -> CharacteristicData {
        match self.registry.resolve_codec(uuid) {
            Some(codec) => {
                let spec = self.registry.resolve_characteristic(uuid);
                parse_with(codec.as_ref(), spec.as_ref(), data, context)
            }
            None => {
                let name = self
                    .registry
                    .resolve_characteristic(uuid)
                    .map(|spec| spec.name)
                    .unwrap_or_default();
                CharacteristicData::failure(uuid, &name, data, GattError::UuidNotFound(uuid))
            }
        }
    }

    /// Parses with an explicit codec, skipping UUID resolution.
    pub fn parse_with_codec(
        &self,
        codec: &dyn CharacteristicCodec,
        data: &[u8],
        context: &CharacteristicContext,
    ) -> CharacteristicData {
        let spec = self.registry.resolve_characteristic(codec.uuid());
        parse_with(codec, spec.as_ref(), data, context)
    }

    /// Parses several values independently, preserving input order.
    ///
    /// One undecodable value does not affect the others.
    pub fn parse_batch<'a, I>(&self, values: I) -> Vec<CharacteristicData>
    where
        I: IntoIterator<Item = (BluetoothUuid, &'a [u8])>,
    {
        values
            .into_iter()
            .map(|(uuid, data)| self.parse(uuid, data))
            .collect()
    }

    /// Validates and encodes a value for writing.
    pub fn encode(&self, uuid: BluetoothUuid, value: &Value) -> Result<Vec<u8>, GattError> {
        let codec = self
            .registry
            .resolve_codec(uuid)
            .ok_or(GattError::UuidNotFound(uuid))?;
        let spec = self.registry.resolve_characteristic(uuid);
        encode_with(codec.as_ref(), spec.as_ref(), value)
    }

    pub fn register_custom(&self, codec: Arc<dyn CharacteristicCodec>) -> Result<(), GattError> {
        self.registry.register_custom(codec)
    }

    pub fn unregister_custom(&self, uuid: BluetoothUuid) {
        self.registry.unregister_custom(uuid)
    }

    /// Records the service layout discovered on a device, for later sibling
    /// queries during dependency resolution.
    pub fn process_services<I, C>(&self, services: I)
    where
        I: IntoIterator<Item = (BluetoothUuid, C)>,
        C: AsRef<[BluetoothUuid]>,
    {
        let mut siblings = self.siblings.write().unwrap();
        for (_, characteristics) in services {
            let characteristics = characteristics.as_ref();
            for &uuid in characteristics {
                let peers: Vec<BluetoothUuid> = characteristics
                    .iter()
                    .copied()
                    .filter(|&peer| peer != uuid)
                    .collect();
                siblings.insert(uuid, peers);
            }
        }
    }

    /// The sibling characteristics recorded for a UUID by `process_services`.
    pub fn siblings_of(&self, uuid: BluetoothUuid) -> Vec<BluetoothUuid> {
        self.siblings
            .read()
            .unwrap()
            .get(&uuid)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}
