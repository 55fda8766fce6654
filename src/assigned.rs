//! Lazy loading of the vendored Bluetooth SIG assigned-numbers YAML tree.
//!
//! Each category is parsed exactly once, on first access. A category whose
//! data file is not vendored yields an empty registry and a warning; an entry
//! that fails to parse is skipped with a warning. Loading never fails.

use crate::bleuuid::BluetoothUuid;
use crate::spec::{FieldSpec, FieldType};
use lazy_static::lazy_static;
use log::warn;
use serde_derive::Deserialize;
use std::collections::HashMap;

const SERVICE_UUIDS_YAML: Option<&str> = Some(include_str!("../data/uuids/service_uuids.yaml"));
const CHARACTERISTIC_UUIDS_YAML: Option<&str> =
    Some(include_str!("../data/uuids/characteristic_uuids.yaml"));
const DESCRIPTORS_YAML: Option<&str> = Some(include_str!("../data/uuids/descriptors.yaml"));
const UNITS_YAML: Option<&str> = Some(include_str!("../data/uuids/units.yaml"));
const DECLARATIONS_YAML: Option<&str> = Some(include_str!("../data/uuids/declarations.yaml"));
const MEMBERS_YAML: Option<&str> = Some(include_str!("../data/uuids/members.yaml"));
const OBJECT_TYPES_YAML: Option<&str> = Some(include_str!("../data/uuids/object_types.yaml"));
const MESH_PROFILE_UUIDS_YAML: Option<&str> =
    Some(include_str!("../data/uuids/mesh_profile_uuids.yaml"));
const SERVICE_CLASS_YAML: Option<&str> = Some(include_str!("../data/uuids/service_class.yaml"));
const APPEARANCE_VALUES_YAML: Option<&str> =
    Some(include_str!("../data/uuids/appearance_values.yaml"));

/// The per-characteristic and per-service field schemas from the GATT
/// specification supplement, keyed by reverse-DNS identifier.
const GSS_YAML: &[&str] = &[
    include_str!("../data/gss/org.bluetooth.characteristic.age.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.altitude.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.apparent_wind_direction.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.apparent_wind_speed.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.battery_level.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.co2_concentration.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.date_time.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.device_name.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.dew_point.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.electric_current.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.elevation.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.gust_factor.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.heart_rate_max.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.heat_index.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.height.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.humidity.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.illuminance.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.irradiance.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.luminous_flux.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.magnetic_declination.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.magnetic_flux_density_3d.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.manufacturer_name_string.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.measurement_interval.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.model_number_string.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.pollen_concentration.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.power.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.pressure.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.rainfall.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.resting_heart_rate.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.temperature.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.time_zone.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.true_wind_direction.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.true_wind_speed.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.tx_power_level.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.uv_index.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.voltage.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.weight.yaml"),
    include_str!("../data/gss/org.bluetooth.characteristic.wind_chill.yaml"),
    include_str!("../data/gss/org.bluetooth.service.battery_service.yaml"),
    include_str!("../data/gss/org.bluetooth.service.blood_pressure.yaml"),
    include_str!("../data/gss/org.bluetooth.service.cycling_power.yaml"),
    include_str!("../data/gss/org.bluetooth.service.environmental_sensing.yaml"),
    include_str!("../data/gss/org.bluetooth.service.glucose.yaml"),
    include_str!("../data/gss/org.bluetooth.service.health_thermometer.yaml"),
    include_str!("../data/gss/org.bluetooth.service.heart_rate.yaml"),
];

/// A plain `{uuid, name, id}` entry from one of the `uuids/` files.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct UuidEntry {
    pub uuid: BluetoothUuid,
    pub name: String,
    pub id: String,
}

/// A unit entry, which additionally carries a display symbol.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct UnitEntry {
    pub uuid: BluetoothUuid,
    pub name: String,
    pub id: String,
    pub symbol: String,
}

/// One appearance category with its subcategories.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct AppearanceCategory {
    pub category: u16,
    pub name: String,
    pub subcategories: Vec<(u16, String)>,
}

/// A characteristic's field schema from the specification supplement.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GssCharacteristic {
    pub name: String,
    pub identifier: String,
    pub fields: Vec<FieldSpec>,
}

/// A service's characteristic requirements from the specification supplement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct GssService {
    pub name: String,
    pub identifier: String,
    /// Names of characteristics a conforming server must expose.
    pub mandatory: Vec<String>,
    /// Names of characteristics the service may expose.
    pub optional: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawUuidFile {
    uuids: Vec<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
struct RawUuidEntry {
    uuid: String,
    name: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct RawAppearanceFile {
    appearance_values: Vec<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
struct RawAppearanceCategory {
    category: u16,
    name: String,
    #[serde(default)]
    subcategory: Vec<RawAppearanceSubcategory>,
}

#[derive(Debug, Deserialize)]
struct RawAppearanceSubcategory {
    value: u16,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawGssFile {
    characteristic: Option<RawGssCharacteristic>,
    service: Option<RawGssService>,
}

#[derive(Debug, Deserialize)]
struct RawGssCharacteristic {
    name: String,
    identifier: String,
    #[serde(default)]
    fields: Vec<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
struct RawGssField {
    field: String,
    #[serde(rename = "type")]
    data_type: String,
    #[serde(default)]
    size: Option<usize>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    resolution: Option<f64>,
    #[serde(default)]
    offset: Option<f64>,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawGssService {
    name: String,
    identifier: String,
    #[serde(default)]
    characteristics: Vec<RawGssServiceCharacteristic>,
}

#[derive(Debug, Deserialize)]
struct RawGssServiceCharacteristic {
    name: String,
    requirement: String,
}

fn parse_uuid_entry(category: &str, raw: serde_yaml::Value) -> Option<RawUuidEntry> {
    match serde_yaml::from_value::<RawUuidEntry>(raw) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("Skipping malformed {category} entry: {e}");
            None
        }
    }
}

fn parse_uuid_file(category: &str, source: Option<&str>) -> Vec<RawUuidEntry> {
    let Some(source) = source else {
        warn!("No assigned-numbers data vendored for {category}; registry will be empty");
        return Vec::new();
    };
    let file: RawUuidFile = match serde_yaml::from_str(source) {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to parse {category} data: {e}; registry will be empty");
            return Vec::new();
        }
    };
    file.uuids
        .into_iter()
        .filter_map(|raw| parse_uuid_entry(category, raw))
        .collect()
}

fn parse_uuid_entries(category: &'static str, source: Option<&str>) -> Vec<UuidEntry> {
    parse_uuid_file(category, source)
        .into_iter()
        .filter_map(|entry| match BluetoothUuid::parse(&entry.uuid) {
            Ok(uuid) => Some(UuidEntry {
                uuid,
                name: entry.name,
                id: entry.id,
            }),
            Err(e) => {
                warn!("Skipping {category} entry {:?}: {e}", entry.name);
                None
            }
        })
        .collect()
}

fn parse_unit_entries(source: Option<&str>) -> Vec<UnitEntry> {
    parse_uuid_file("units", source)
        .into_iter()
        .filter_map(|entry| match BluetoothUuid::parse(&entry.uuid) {
            Ok(uuid) => Some(UnitEntry {
                uuid,
                name: entry.name,
                id: entry.id,
                symbol: entry.symbol,
            }),
            Err(e) => {
                warn!("Skipping unit entry {:?}: {e}", entry.name);
                None
            }
        })
        .collect()
}

fn parse_appearance_values(source: Option<&str>) -> Vec<AppearanceCategory> {
    let Some(source) = source else {
        warn!("No appearance data vendored; registry will be empty");
        return Vec::new();
    };
    let file: RawAppearanceFile = match serde_yaml::from_str(source) {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to parse appearance data: {e}; registry will be empty");
            return Vec::new();
        }
    };
    file.appearance_values
        .into_iter()
        .filter_map(
            |raw| match serde_yaml::from_value::<RawAppearanceCategory>(raw) {
                Ok(category) => Some(AppearanceCategory {
                    category: category.category,
                    name: category.name,
                    subcategories: category
                        .subcategory
                        .into_iter()
                        .map(|sub| (sub.value, sub.name))
                        .collect(),
                }),
                Err(e) => {
                    warn!("Skipping malformed appearance entry: {e}");
                    None
                }
            },
        )
        .collect()
}

fn parse_gss_field(identifier: &str, raw: serde_yaml::Value) -> Option<FieldSpec> {
    let raw: RawGssField = match serde_yaml::from_value(raw) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Skipping malformed field of {identifier}: {e}");
            return None;
        }
    };
    let Some(data_type) = FieldType::from_yaml(&raw.data_type) else {
        warn!(
            "Skipping field {:?} of {identifier}: unknown type {:?}",
            raw.field, raw.data_type
        );
        return None;
    };
    Some(FieldSpec {
        name: raw.field,
        data_type,
        size_bytes: raw.size.or(data_type.size()).unwrap_or(0),
        unit_id: raw.unit,
        resolution: raw.resolution,
        offset: raw.offset,
        optional: raw.optional,
        min_value: raw.min,
        max_value: raw.max,
    })
}

fn parse_gss_files() -> (
    HashMap<String, GssCharacteristic>,
    HashMap<String, GssService>,
) {
    let mut characteristics = HashMap::new();
    let mut services = HashMap::new();
    for source in GSS_YAML {
        let file: RawGssFile = match serde_yaml::from_str(source) {
            Ok(file) => file,
            Err(e) => {
                warn!("Skipping malformed specification supplement file: {e}");
                continue;
            }
        };
        if let Some(characteristic) = file.characteristic {
            let fields = characteristic
                .fields
                .into_iter()
                .filter_map(|raw| parse_gss_field(&characteristic.identifier, raw))
                .collect();
            characteristics.insert(
                characteristic.identifier.clone(),
                GssCharacteristic {
                    name: characteristic.name,
                    identifier: characteristic.identifier,
                    fields,
                },
            );
        }
        if let Some(service) = file.service {
            let mut mandatory = Vec::new();
            let mut optional = Vec::new();
            for characteristic in service.characteristics {
                match characteristic.requirement.as_str() {
                    "mandatory" => mandatory.push(characteristic.name),
                    "optional" => optional.push(characteristic.name),
                    other => warn!(
                        "Unknown requirement {other:?} for {:?} in {}",
                        characteristic.name, service.identifier
                    ),
                }
            }
            services.insert(
                service.identifier.clone(),
                GssService {
                    name: service.name,
                    identifier: service.identifier,
                    mandatory,
                    optional,
                },
            );
        }
    }
    (characteristics, services)
}

lazy_static! {
    static ref SERVICE_UUIDS: Vec<UuidEntry> =
        parse_uuid_entries("service UUIDs", SERVICE_UUIDS_YAML);
    static ref CHARACTERISTIC_UUIDS: Vec<UuidEntry> =
        parse_uuid_entries("characteristic UUIDs", CHARACTERISTIC_UUIDS_YAML);
    static ref DESCRIPTORS: Vec<UuidEntry> = parse_uuid_entries("descriptors", DESCRIPTORS_YAML);
    static ref UNITS: Vec<UnitEntry> = parse_unit_entries(UNITS_YAML);
    static ref DECLARATIONS: Vec<UuidEntry> =
        parse_uuid_entries("declarations", DECLARATIONS_YAML);
    static ref MEMBERS: Vec<UuidEntry> = parse_uuid_entries("SIG members", MEMBERS_YAML);
    static ref OBJECT_TYPES: Vec<UuidEntry> =
        parse_uuid_entries("object types", OBJECT_TYPES_YAML);
    static ref MESH_PROFILES: Vec<UuidEntry> =
        parse_uuid_entries("mesh profiles", MESH_PROFILE_UUIDS_YAML);
    static ref SERVICE_CLASSES: Vec<UuidEntry> =
        parse_uuid_entries("service classes", SERVICE_CLASS_YAML);
    static ref APPEARANCE_VALUES: Vec<AppearanceCategory> =
        parse_appearance_values(APPEARANCE_VALUES_YAML);
    static ref GSS: (
        HashMap<String, GssCharacteristic>,
        HashMap<String, GssService>
    ) = parse_gss_files();
}

pub(crate) fn service_uuids() -> &'static [UuidEntry] {
    &SERVICE_UUIDS
}

pub(crate) fn characteristic_uuids() -> &'static [UuidEntry] {
    &CHARACTERISTIC_UUIDS
}

pub(crate) fn descriptors() -> &'static [UuidEntry] {
    &DESCRIPTORS
}

pub(crate) fn units() -> &'static [UnitEntry] {
    &UNITS
}

pub(crate) fn declarations() -> &'static [UuidEntry] {
    &DECLARATIONS
}

pub(crate) fn members() -> &'static [UuidEntry] {
    &MEMBERS
}

pub(crate) fn object_types() -> &'static [UuidEntry] {
    &OBJECT_TYPES
}

pub(crate) fn mesh_profiles() -> &'static [UuidEntry] {
    &MESH_PROFILES
}

pub(crate) fn service_classes() -> &'static [UuidEntry] {
    &SERVICE_CLASSES
}

pub(crate) fn appearance_values() -> &'static [AppearanceCategory] {
    &APPEARANCE_VALUES
}

pub(crate) fn gss_characteristics() -> &'static HashMap<String, GssCharacteristic> {
    &GSS.0
}

pub(crate) fn gss_services() -> &'static HashMap<String, GssService> {
    &GSS.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn characteristic_uuids_load() {
        let entries = characteristic_uuids();
        assert!(!entries.is_empty());
        let battery = entries
            .iter()
            .find(|entry| entry.uuid == BluetoothUuid::from_u16(0x2a19))
            .unwrap();
        assert_eq!(battery.name, "Battery Level");
        assert_eq!(battery.id, "org.bluetooth.characteristic.battery_level");
    }

    #[test]
    fn missing_category_is_empty() {
        assert!(parse_uuid_entries("nonexistent", None).is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let source = "uuids:\n - uuid: \"2A19\"\n   name: Battery Level\n - uuid: \"xyzw\"\n   name: Broken\n - name: No UUID\n";
        let entries = parse_uuid_entries("test", Some(source));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Battery Level");
    }

    #[test]
    fn gss_fields_load() {
        let temperature = &gss_characteristics()["org.bluetooth.characteristic.temperature"];
        assert_eq!(temperature.name, "Temperature");
        assert_eq!(temperature.fields.len(), 1);
        let field = &temperature.fields[0];
        assert_eq!(field.data_type, FieldType::SInt16);
        assert_eq!(field.resolution, Some(0.01));
    }

    #[test]
    fn gss_services_load() {
        let heart_rate = &gss_services()["org.bluetooth.service.heart_rate"];
        assert!(heart_rate
            .mandatory
            .contains(&"Heart Rate Measurement".to_owned()));
        assert!(heart_rate
            .optional
            .contains(&"Body Sensor Location".to_owned()));
    }

    #[test]
    fn units_have_symbols() {
        let percentage = units()
            .iter()
            .find(|unit| unit.id == "org.bluetooth.unit.percentage")
            .unwrap();
        assert_eq!(percentage.symbol, "%");
    }

    #[test]
    fn appearance_values_load() {
        let heart_rate_sensor = appearance_values()
            .iter()
            .find(|category| category.category == 13)
            .unwrap();
        assert_eq!(heart_rate_sensor.name, "Heart Rate Sensor");
        assert_eq!(
            heart_rate_sensor.subcategories,
            vec![(1, "Heart Rate Belt".to_owned())]
        );
    }
}
