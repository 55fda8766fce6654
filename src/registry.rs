//! The registry index: UUID and name lookups over the loaded assigned-numbers
//! data, the built-in codec roster, and the custom-registration overlay.

use crate::assigned;
use crate::bleuuid::BluetoothUuid;
use crate::characteristic::generic::GenericCodec;
use crate::characteristic::standard_codecs;
use crate::codec::CharacteristicCodec;
use crate::error::GattError;
use crate::spec::{
    AssignedNumber, CharacteristicSpec, DescriptorSpec, ServiceSpec, UnitSpec,
};
use crate::types::ValueType;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The index over the SIG registries plus the custom overlay.
///
/// The SIG side is built once at construction and never mutated; reads of it
/// take no lock. Custom registrations live in a side map behind a
/// reader-writer lock and are consulted before the SIG data.
pub struct RegistryIndex {
    characteristics: HashMap<BluetoothUuid, CharacteristicSpec>,
    characteristic_names: HashMap<String, BluetoothUuid>,
    services: HashMap<BluetoothUuid, ServiceSpec>,
    service_names: HashMap<String, BluetoothUuid>,
    descriptors: HashMap<BluetoothUuid, DescriptorSpec>,
    descriptor_names: HashMap<String, BluetoothUuid>,
    units: HashMap<BluetoothUuid, UnitSpec>,
    unit_ids: HashMap<String, BluetoothUuid>,
    declarations: HashMap<BluetoothUuid, AssignedNumber>,
    members: HashMap<BluetoothUuid, AssignedNumber>,
    object_types: HashMap<BluetoothUuid, AssignedNumber>,
    mesh_profiles: HashMap<BluetoothUuid, AssignedNumber>,
    service_classes: HashMap<BluetoothUuid, AssignedNumber>,
    codecs: HashMap<BluetoothUuid, Arc<dyn CharacteristicCodec>>,
    custom: RwLock<HashMap<BluetoothUuid, Arc<dyn CharacteristicCodec>>>,
}

impl RegistryIndex {
    /// Builds an index over the vendored SIG data and built-in codecs.
    pub fn new() -> Self {
        let mut units = HashMap::new();
        let mut unit_ids = HashMap::new();
        for entry in assigned::units() {
            unit_ids.insert(entry.id.clone(), entry.uuid);
            units.insert(
                entry.uuid,
                UnitSpec {
                    uuid: entry.uuid,
                    name: entry.name.clone(),
                    id: entry.id.clone(),
                    symbol: entry.symbol.clone(),
                },
            );
        }

        let mut codecs: HashMap<BluetoothUuid, Arc<dyn CharacteristicCodec>> = HashMap::new();
        for codec in standard_codecs() {
            codecs.insert(codec.uuid(), codec);
        }

        let gss = assigned::gss_characteristics();
        let mut characteristics = HashMap::new();
        let mut characteristic_names = HashMap::new();
        for entry in assigned::characteristic_uuids() {
            let fields = gss
                .get(&entry.id)
                .map(|schema| schema.fields.clone())
                .unwrap_or_default();
            let value_type = match codecs.get(&entry.uuid) {
                Some(codec) => codec
                    .constraints()
                    .expected_type
                    .unwrap_or(ValueType::Unknown),
                None => value_type_from_fields(&fields),
            };
            let spec = CharacteristicSpec {
                uuid: entry.uuid,
                name: entry.name.clone(),
                id: entry.id.clone(),
                fields,
                value_type,
                required_descriptors: Vec::new(),
            };
            // Characteristics with a field schema but no dedicated codec get
            // the schema-driven fallback.
            if !codecs.contains_key(&entry.uuid) && !spec.fields.is_empty() {
                let unit = spec.fields[0]
                    .unit_id
                    .as_ref()
                    .and_then(|id| unit_ids.get(id))
                    .and_then(|uuid| units.get(uuid))
                    .map(|unit| unit.symbol.clone())
                    .unwrap_or_default();
                codecs.insert(entry.uuid, Arc::new(GenericCodec::new(spec.clone(), unit)));
            }
            characteristic_names.insert(entry.name.to_lowercase(), entry.uuid);
            characteristics.insert(entry.uuid, spec);
        }

        let gss_services = assigned::gss_services();
        let mut services = HashMap::new();
        let mut service_names = HashMap::new();
        for entry in assigned::service_uuids() {
            let (mandatory, optional) = match gss_services.get(&entry.id) {
                Some(schema) => (
                    resolve_names(&schema.mandatory, &characteristic_names),
                    resolve_names(&schema.optional, &characteristic_names),
                ),
                None => (Vec::new(), Vec::new()),
            };
            service_names.insert(entry.name.to_lowercase(), entry.uuid);
            services.insert(
                entry.uuid,
                ServiceSpec {
                    uuid: entry.uuid,
                    name: entry.name.clone(),
                    id: entry.id.clone(),
                    mandatory_characteristics: mandatory,
                    optional_characteristics: optional,
                },
            );
        }

        let mut descriptors = HashMap::new();
        let mut descriptor_names = HashMap::new();
        for entry in assigned::descriptors() {
            descriptor_names.insert(entry.name.to_lowercase(), entry.uuid);
            descriptors.insert(
                entry.uuid,
                DescriptorSpec {
                    uuid: entry.uuid,
                    name: entry.name.clone(),
                    id: entry.id.clone(),
                },
            );
        }

        Self {
            characteristics,
            characteristic_names,
            services,
            service_names,
            descriptors,
            descriptor_names,
            units,
            unit_ids,
            declarations: plain_map(assigned::declarations()),
            members: plain_map(assigned::members()),
            object_types: plain_map(assigned::object_types()),
            mesh_profiles: plain_map(assigned::mesh_profiles()),
            service_classes: plain_map(assigned::service_classes()),
            codecs,
            custom: RwLock::new(HashMap::new()),
        }
    }

    /// The characteristic spec for a UUID, custom registrations first.
    pub fn resolve_characteristic(&self, uuid: BluetoothUuid) -> Option<CharacteristicSpec> {
        if let Some(codec) = self.custom.read().unwrap().get(&uuid) {
            return Some(spec_for_custom(codec.as_ref()));
        }
        self.characteristics.get(&uuid).cloned()
    }

    /// Case-insensitive lookup by canonical name.
    pub fn resolve_characteristic_by_name(&self, name: &str) -> Option<CharacteristicSpec> {
        let lowered = name.to_lowercase();
        {
            let custom = self.custom.read().unwrap();
            if let Some(codec) = custom
                .values()
                .find(|codec| codec.name().to_lowercase() == lowered)
            {
                return Some(spec_for_custom(codec.as_ref()));
            }
        }
        let uuid = self.characteristic_names.get(&lowered)?;
        self.characteristics.get(uuid).cloned()
    }

    pub fn resolve_service(&self, uuid: BluetoothUuid) -> Option<&ServiceSpec> {
        self.services.get(&uuid)
    }

    pub fn resolve_service_by_name(&self, name: &str) -> Option<&ServiceSpec> {
        let uuid = self.service_names.get(&name.to_lowercase())?;
        self.services.get(uuid)
    }

    pub fn resolve_descriptor(&self, uuid: BluetoothUuid) -> Option<&DescriptorSpec> {
        self.descriptors.get(&uuid)
    }

    pub fn resolve_descriptor_by_name(&self, name: &str) -> Option<&DescriptorSpec> {
        let uuid = self.descriptor_names.get(&name.to_lowercase())?;
        self.descriptors.get(uuid)
    }

    pub fn resolve_unit(&self, uuid: BluetoothUuid) -> Option<&UnitSpec> {
        self.units.get(&uuid)
    }

    /// Unit lookup by reverse-DNS identifier, e.g. "org.bluetooth.unit.percentage".
    pub fn resolve_unit_by_id(&self, id: &str) -> Option<&UnitSpec> {
        self.units.get(self.unit_ids.get(id)?)
    }

    pub fn resolve_declaration(&self, uuid: BluetoothUuid) -> Option<&AssignedNumber> {
        self.declarations.get(&uuid)
    }

    pub fn resolve_member(&self, uuid: BluetoothUuid) -> Option<&AssignedNumber> {
        self.members.get(&uuid)
    }

    pub fn resolve_object_type(&self, uuid: BluetoothUuid) -> Option<&AssignedNumber> {
        self.object_types.get(&uuid)
    }

    pub fn resolve_mesh_profile(&self, uuid: BluetoothUuid) -> Option<&AssignedNumber> {
        self.mesh_profiles.get(&uuid)
    }

    pub fn resolve_service_class(&self, uuid: BluetoothUuid) -> Option<&AssignedNumber> {
        self.service_classes.get(&uuid)
    }

    /// All known characteristics, in no particular order. Custom
    /// registrations shadow their SIG counterparts.
    pub fn list_characteristics(&self) -> Vec<CharacteristicSpec> {
        let custom = self.custom.read().unwrap();
        let mut list: Vec<CharacteristicSpec> = custom
            .values()
            .map(|codec| spec_for_custom(codec.as_ref()))
            .collect();
        list.extend(
            self.characteristics
                .iter()
                .filter(|(uuid, _)| !custom.contains_key(uuid))
                .map(|(_, spec)| spec.clone()),
        );
        list
    }

    /// The codec for a UUID, custom registrations first.
    pub(crate) fn resolve_codec(
        &self,
        uuid: BluetoothUuid,
    ) -> Option<Arc<dyn CharacteristicCodec>> {
        if let Some(codec) = self.custom.read().unwrap().get(&uuid) {
            return Some(codec.clone());
        }
        self.codecs.get(&uuid).cloned()
    }

    /// Whether any codec, SIG or custom, can handle the UUID.
    pub fn supports(&self, uuid: BluetoothUuid) -> bool {
        self.custom.read().unwrap().contains_key(&uuid) || self.codecs.contains_key(&uuid)
    }

    /// Registers a custom codec.
    ///
    /// A custom entry for a UUID that already has a custom entry always
    /// replaces it. Shadowing a SIG entry requires the codec to declare
    /// `allows_override`.
    pub fn register_custom(
        &self,
        codec: Arc<dyn CharacteristicCodec>,
    ) -> Result<(), GattError> {
        let uuid = codec.uuid();
        let mut custom = self.custom.write().unwrap();
        let shadows_sig =
            self.codecs.contains_key(&uuid) || self.characteristics.contains_key(&uuid);
        if shadows_sig && !custom.contains_key(&uuid) && !codec.allows_override() {
            return Err(GattError::UuidConflict(uuid));
        }
        custom.insert(uuid, codec);
        Ok(())
    }

    /// Removes a custom codec, transparently restoring any shadowed SIG entry.
    pub fn unregister_custom(&self, uuid: BluetoothUuid) {
        self.custom.write().unwrap().remove(&uuid);
    }
}

impl Default for RegistryIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn plain_map(entries: &[assigned::UuidEntry]) -> HashMap<BluetoothUuid, AssignedNumber> {
    entries
        .iter()
        .map(|entry| {
            (
                entry.uuid,
                AssignedNumber {
                    uuid: entry.uuid,
                    name: entry.name.clone(),
                    id: entry.id.clone(),
                },
            )
        })
        .collect()
}

fn resolve_names(
    names: &[String],
    characteristic_names: &HashMap<String, BluetoothUuid>,
) -> Vec<BluetoothUuid> {
    names
        .iter()
        .filter_map(|name| characteristic_names.get(&name.to_lowercase()).copied())
        .collect()
}

fn value_type_from_fields(fields: &[crate::spec::FieldSpec]) -> ValueType {
    use crate::spec::FieldType;
    match fields {
        [] => ValueType::Unknown,
        [field] => match field.data_type {
            FieldType::Utf8 | FieldType::Utf16 => ValueType::Text,
            _ => ValueType::Numeric,
        },
        _ => ValueType::Structured,
    }
}

fn spec_for_custom(codec: &dyn CharacteristicCodec) -> CharacteristicSpec {
    CharacteristicSpec {
        uuid: codec.uuid(),
        name: codec.name().to_owned(),
        id: String::new(),
        fields: Vec::new(),
        value_type: codec
            .constraints()
            .expected_type
            .unwrap_or(ValueType::Unknown),
        required_descriptors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Constraints;
    use crate::context::CharacteristicContext;
    use crate::types::Value;

    struct CustomCodec {
        uuid: BluetoothUuid,
        allows_override: bool,
    }

    impl CharacteristicCodec for CustomCodec {
        fn uuid(&self) -> BluetoothUuid {
            self.uuid
        }

        fn name(&self) -> &str {
            "Vendor Reading"
        }

        fn constraints(&self) -> Constraints {
            Constraints::exact(1).typed(ValueType::Numeric)
        }

        fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
            Ok(Value::Unsigned(data[0].into()))
        }

        fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
            match value {
                Value::Unsigned(value) => Ok(vec![*value as u8]),
                other => Err(GattError::TypeMismatch {
                    expected: ValueType::Numeric,
                    actual: other.value_type(),
                }),
            }
        }

        fn allows_override(&self) -> bool {
            self.allows_override
        }
    }

    #[test]
    fn resolve_sig_characteristic() {
        let registry = RegistryIndex::new();
        let spec = registry
            .resolve_characteristic(BluetoothUuid::from_u16(0x2a19))
            .unwrap();
        assert_eq!(spec.name, "Battery Level");
        assert_eq!(spec.id, "org.bluetooth.characteristic.battery_level");
        assert_eq!(spec.value_type, ValueType::Numeric);
    }

    #[test]
    fn resolve_by_name_case_insensitive() {
        let registry = RegistryIndex::new();
        let spec = registry
            .resolve_characteristic_by_name("heart rate measurement")
            .unwrap();
        assert_eq!(spec.uuid, BluetoothUuid::from_u16(0x2a37));
    }

    #[test]
    fn resolve_service_with_requirements() {
        let registry = RegistryIndex::new();
        let service = registry
            .resolve_service(BluetoothUuid::from_u16(0x180d))
            .unwrap();
        assert_eq!(service.name, "Heart Rate");
        assert!(service
            .mandatory_characteristics
            .contains(&BluetoothUuid::from_u16(0x2a37)));
        assert!(service
            .optional_characteristics
            .contains(&BluetoothUuid::from_u16(0x2a38)));
    }

    #[test]
    fn resolve_other_categories() {
        let registry = RegistryIndex::new();
        assert_eq!(
            registry
                .resolve_descriptor(BluetoothUuid::from_u16(0x2902))
                .unwrap()
                .name,
            "Client Characteristic Configuration"
        );
        assert_eq!(
            registry
                .resolve_unit_by_id("org.bluetooth.unit.percentage")
                .unwrap()
                .symbol,
            "%"
        );
        assert_eq!(
            registry
                .resolve_declaration(BluetoothUuid::from_u16(0x2800))
                .unwrap()
                .name,
            "Primary Service"
        );
        assert_eq!(
            registry
                .resolve_member(BluetoothUuid::from_u16(0xfe95))
                .unwrap()
                .name,
            "Xiaomi Inc."
        );
        assert!(registry
            .resolve_mesh_profile(BluetoothUuid::from_u16(0x1827))
            .is_some());
        assert!(registry
            .resolve_service_class(BluetoothUuid::from_u16(0x1101))
            .is_some());
        assert!(registry
            .resolve_object_type(BluetoothUuid::from_u16(0x2aca))
            .is_some());
    }

    #[test]
    fn generic_codec_for_schema_only_characteristic() {
        let registry = RegistryIndex::new();
        // Tx Power Level has a field schema but no dedicated codec.
        let uuid = BluetoothUuid::from_u16(0x2a07);
        assert!(registry.supports(uuid));
        let codec = registry.resolve_codec(uuid).unwrap();
        assert_eq!(
            codec
                .decode(&[0xfc], &CharacteristicContext::new())
                .unwrap(),
            Value::Signed(-4)
        );
    }

    #[test]
    fn custom_registration_without_sig_entry() {
        let registry = RegistryIndex::new();
        let uuid = BluetoothUuid::parse("ebe0ccb0-7a0a-4b0c-8a1a-6ff2997da3a6").unwrap();
        assert!(!registry.supports(uuid));
        registry
            .register_custom(Arc::new(CustomCodec {
                uuid,
                allows_override: false,
            }))
            .unwrap();
        assert!(registry.supports(uuid));
        assert_eq!(
            registry.resolve_characteristic(uuid).unwrap().name,
            "Vendor Reading"
        );
        registry.unregister_custom(uuid);
        assert!(!registry.supports(uuid));
    }

    #[test]
    fn override_rules() {
        let registry = RegistryIndex::new();
        let uuid = BluetoothUuid::from_u16(0x2a19);
        // Shadowing a SIG entry needs the override flag.
        assert_eq!(
            registry.register_custom(Arc::new(CustomCodec {
                uuid,
                allows_override: false,
            })),
            Err(GattError::UuidConflict(uuid))
        );
        registry
            .register_custom(Arc::new(CustomCodec {
                uuid,
                allows_override: true,
            }))
            .unwrap();
        assert_eq!(
            registry.resolve_characteristic(uuid).unwrap().name,
            "Vendor Reading"
        );
        // Replacing an existing custom entry is always allowed.
        registry
            .register_custom(Arc::new(CustomCodec {
                uuid,
                allows_override: false,
            }))
            .unwrap();
        // Unregistering restores the SIG entry.
        registry.unregister_custom(uuid);
        assert_eq!(
            registry.resolve_characteristic(uuid).unwrap().name,
            "Battery Level"
        );
    }

    #[test]
    fn list_characteristics_shadows_sig() {
        let registry = RegistryIndex::new();
        let total = registry.list_characteristics().len();
        registry
            .register_custom(Arc::new(CustomCodec {
                uuid: BluetoothUuid::from_u16(0x2a19),
                allows_override: true,
            }))
            .unwrap();
        let listed = registry.list_characteristics();
        assert_eq!(listed.len(), total);
        assert!(listed.iter().any(|spec| spec.name == "Vendor Reading"));
        assert!(!listed.iter().any(|spec| spec.name == "Battery Level"));
    }
}
