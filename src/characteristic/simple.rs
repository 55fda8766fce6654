//! Template-driven characteristics: each is one declaration pairing a UUID
//! with a leaf template, a unit and its sentinel values.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::ieee11073::Sfloat;
use crate::template::int::{SINT16, SINT24, SINT8, UINT16, UINT24, UINT32, UINT8};
use crate::template::scaled::ScaledTemplate;
use crate::template::text::{TextTemplate, MAX_LENGTH, UTF8};
use crate::template::time::DateTime;
use crate::template::vector::VectorTemplate;
use crate::types::{Value, ValueType};
use std::sync::Arc;

/// A characteristic carrying a single scaled integer.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ScalarCodec {
    uuid: u16,
    name: &'static str,
    unit: &'static str,
    template: ScaledTemplate,
    /// Raw values meaning "value is not known".
    special: &'static [i64],
    range: Option<(f64, f64)>,
}

const fn scalar(
    uuid: u16,
    name: &'static str,
    unit: &'static str,
    template: ScaledTemplate,
) -> ScalarCodec {
    ScalarCodec {
        uuid,
        name,
        unit,
        template,
        special: &[],
        range: None,
    }
}

impl ScalarCodec {
    const fn sentinel(self, special: &'static [i64]) -> Self {
        Self { special, ..self }
    }

    const fn range(self, min: f64, max: f64) -> Self {
        Self {
            range: Some((min, max)),
            ..self
        }
    }
}

impl CharacteristicCodec for ScalarCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(self.uuid)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn unit(&self) -> &str {
        self.unit
    }

    fn constraints(&self) -> Constraints {
        let mut constraints =
            Constraints::exact(self.template.int().width()).typed(ValueType::Numeric);
        if let Some((min, max)) = self.range {
            constraints = constraints.ranged(min, max);
        }
        constraints
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        let raw = self.template.int().decode(data)?;
        if self.special.contains(&raw) {
            return Ok(Value::NotPresent);
        }
        if self.template.is_integer() {
            Ok(if self.template.int().signed() {
                Value::Signed(raw)
            } else {
                Value::Unsigned(raw as u64)
            })
        } else {
            Ok(Value::Float(self.template.scale(raw)))
        }
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::NotPresent => match self.special.first() {
                Some(&raw) => self.template.int().encode(raw),
                None => Err(GattError::TypeMismatch {
                    expected: ValueType::Numeric,
                    actual: ValueType::Unknown,
                }),
            },
            Value::Unsigned(raw) if self.template.is_integer() => {
                self.template.int().encode(*raw as i64)
            }
            Value::Signed(raw) if self.template.is_integer() => self.template.int().encode(*raw),
            Value::Float(value) => self.template.encode(*value),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Numeric,
                actual: other.value_type(),
            }),
        }
    }
}

/// A characteristic carrying one IEEE-11073 SFLOAT.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SfloatCodec {
    uuid: u16,
    name: &'static str,
    unit: &'static str,
}

const fn sfloat(uuid: u16, name: &'static str, unit: &'static str) -> SfloatCodec {
    SfloatCodec { uuid, name, unit }
}

impl CharacteristicCodec for SfloatCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(self.uuid)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn unit(&self) -> &str {
        self.unit
    }

    fn constraints(&self) -> Constraints {
        Constraints::exact(2)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Sfloat::decode(data)?.into_value())
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Float(value) => Sfloat::encode(*value),
            Value::NotPresent => Sfloat::encode(f64::NAN),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Numeric,
                actual: other.value_type(),
            }),
        }
    }
}

/// A characteristic carrying a variable-length string.
#[derive(Copy, Clone, Debug)]
pub(crate) struct TextCodec {
    uuid: u16,
    name: &'static str,
    template: TextTemplate,
}

const fn text(uuid: u16, name: &'static str) -> TextCodec {
    TextCodec {
        uuid,
        name,
        template: UTF8,
    }
}

impl CharacteristicCodec for TextCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(self.uuid)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(0, MAX_LENGTH).typed(ValueType::Text)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::Text(self.template.decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Text(text) => self.template.encode(text),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Text,
                actual: other.value_type(),
            }),
        }
    }
}

/// A characteristic whose value is an opaque fixed-length byte string.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BytesCodec {
    uuid: u16,
    name: &'static str,
    length: usize,
}

impl CharacteristicCodec for BytesCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(self.uuid)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn constraints(&self) -> Constraints {
        Constraints::exact(self.length).typed(ValueType::Bytes)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::Bytes(data.to_owned()))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Bytes(bytes) if bytes.len() == self.length => Ok(bytes.clone()),
            Value::Bytes(bytes) => Err(GattError::WrongLength {
                length: bytes.len(),
                expected_length: self.length,
            }),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Bytes,
                actual: other.value_type(),
            }),
        }
    }
}

/// The Date Time characteristic.
#[derive(Copy, Clone, Debug)]
pub(crate) struct DateTimeCodec;

impl CharacteristicCodec for DateTimeCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a08)
    }

    fn name(&self) -> &str {
        "Date Time"
    }

    fn constraints(&self) -> Constraints {
        Constraints::exact(DateTime::ENCODED_LENGTH).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::DateTime(DateTime::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::DateTime(date_time) => date_time.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

/// A multi-axis characteristic whose components share one scaling.
#[derive(Copy, Clone, Debug)]
pub(crate) struct VectorCodec {
    uuid: u16,
    name: &'static str,
    unit: &'static str,
    template: VectorTemplate,
}

impl CharacteristicCodec for VectorCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(self.uuid)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn unit(&self) -> &str {
        self.unit
    }

    fn constraints(&self) -> Constraints {
        Constraints::NONE.typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::Vector(self.template.decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Vector(components) => self.template.encode(components),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

const CELSIUS_HUNDREDTHS: ScaledTemplate = ScaledTemplate::new(SINT16, 0.01);
const MAGNETIC_FLUX: ScaledTemplate = ScaledTemplate::new(SINT16, 1e-7);

/// The single-scalar roster. One line per characteristic.
const SCALARS: &[ScalarCodec] = &[
    scalar(0x2a19, "Battery Level", "%", ScaledTemplate::new(UINT8, 1.0)).range(0.0, 100.0),
    scalar(0x2a6e, "Temperature", "°C", CELSIUS_HUNDREDTHS).sentinel(&[-32768]),
    scalar(0x2a6f, "Humidity", "%", ScaledTemplate::new(UINT16, 0.01))
        .sentinel(&[0xffff])
        .range(0.0, 100.0),
    scalar(0x2a6d, "Pressure", "Pa", ScaledTemplate::new(UINT32, 0.1)),
    scalar(0x2a6c, "Elevation", "m", ScaledTemplate::new(SINT24, 0.01)),
    scalar(0x2ab3, "Altitude", "m", ScaledTemplate::new(UINT16, 0.01)),
    scalar(0x2a7a, "Heat Index", "°C", ScaledTemplate::new(SINT8, 1.0)).sentinel(&[0x7f]),
    scalar(0x2a7b, "Dew Point", "°C", ScaledTemplate::new(SINT8, 1.0)).sentinel(&[0x7f]),
    scalar(0x2a79, "Wind Chill", "°C", ScaledTemplate::new(SINT8, 1.0)).sentinel(&[0x7f]),
    scalar(0x2a70, "True Wind Speed", "m/s", ScaledTemplate::new(UINT16, 0.01)),
    scalar(0x2a71, "True Wind Direction", "°", ScaledTemplate::new(UINT16, 0.01))
        .range(0.0, 359.99),
    scalar(0x2a72, "Apparent Wind Speed", "m/s", ScaledTemplate::new(UINT16, 0.01)),
    scalar(0x2a73, "Apparent Wind Direction", "°", ScaledTemplate::new(UINT16, 0.01))
        .range(0.0, 359.99),
    scalar(0x2a74, "Gust Factor", "", ScaledTemplate::new(UINT8, 0.1)),
    scalar(0x2a75, "Pollen Concentration", "/m³", ScaledTemplate::new(UINT24, 1.0)),
    scalar(0x2a76, "UV Index", "", ScaledTemplate::new(UINT8, 1.0)).sentinel(&[0xff]),
    scalar(0x2a77, "Irradiance", "W/m²", ScaledTemplate::new(UINT16, 0.1)),
    scalar(0x2a78, "Rainfall", "m", ScaledTemplate::new(UINT16, 0.001)),
    scalar(0x2a21, "Measurement Interval", "s", ScaledTemplate::new(UINT16, 1.0)),
    scalar(0x2a12, "Time Accuracy", "s", ScaledTemplate::new(UINT8, 0.125)).sentinel(&[255]),
    scalar(0x2a0e, "Time Zone", "", ScaledTemplate::new(SINT8, 1.0))
        .sentinel(&[-128])
        .range(-48.0, 56.0),
    scalar(0x2a80, "Age", "years", ScaledTemplate::new(UINT8, 1.0)),
    scalar(0x2a8d, "Heart Rate Max", "bpm", ScaledTemplate::new(UINT8, 1.0)),
    scalar(0x2a92, "Resting Heart Rate", "bpm", ScaledTemplate::new(UINT8, 1.0)),
    scalar(
        0x2a91,
        "Maximum Recommended Heart Rate",
        "bpm",
        ScaledTemplate::new(UINT8, 1.0),
    ),
    scalar(
        0x2a7e,
        "Aerobic Heart Rate Lower Limit",
        "bpm",
        ScaledTemplate::new(UINT8, 1.0),
    ),
    scalar(
        0x2a84,
        "Aerobic Heart Rate Upper Limit",
        "bpm",
        ScaledTemplate::new(UINT8, 1.0),
    ),
    scalar(
        0x2a81,
        "Anaerobic Heart Rate Lower Limit",
        "bpm",
        ScaledTemplate::new(UINT8, 1.0),
    ),
    scalar(
        0x2a82,
        "Anaerobic Heart Rate Upper Limit",
        "bpm",
        ScaledTemplate::new(UINT8, 1.0),
    ),
    scalar(0x2a96, "VO2 Max", "mL/kg/min", ScaledTemplate::new(UINT8, 1.0)).sentinel(&[0xff]),
    scalar(0x2a8e, "Height", "m", ScaledTemplate::new(UINT16, 0.01)),
    scalar(0x2a98, "Weight", "kg", ScaledTemplate::new(UINT16, 0.005)),
    scalar(0x2a8f, "Hip Circumference", "m", ScaledTemplate::new(UINT16, 0.01)),
    scalar(0x2a97, "Waist Circumference", "m", ScaledTemplate::new(UINT16, 0.01)),
    scalar(0x2a9a, "User Index", "", ScaledTemplate::new(UINT8, 1.0)).sentinel(&[0xff]),
    scalar(0x2aee, "Electric Current", "A", ScaledTemplate::new(UINT16, 0.01))
        .sentinel(&[0xffff]),
    scalar(0x2b18, "Voltage", "V", ScaledTemplate::new(UINT16, 1.0 / 64.0)).sentinel(&[0xffff]),
    scalar(0x2b05, "Power", "W", ScaledTemplate::new(UINT24, 0.1)).sentinel(&[0xff_ffff]),
    scalar(0x2af2, "Energy", "kWh", ScaledTemplate::new(UINT24, 1.0)).sentinel(&[0xff_ffff]),
    scalar(0x2afb, "Illuminance", "lux", ScaledTemplate::new(UINT24, 0.01))
        .sentinel(&[0xff_ffff]),
    scalar(0x2aff, "Luminous Flux", "lm", ScaledTemplate::new(UINT16, 1.0)),
    scalar(0x2b8c, "CO2 Concentration", "ppm", ScaledTemplate::new(UINT16, 1.0))
        .sentinel(&[0xffff]),
    scalar(0x2b2c, "Magnetic Declination", "°", ScaledTemplate::new(UINT16, 0.01))
        .range(0.0, 359.99),
];

/// Environmental gas concentrations, all SFLOAT.
const SFLOATS: &[SfloatCodec] = &[
    sfloat(0x2bcf, "Ammonia Concentration", "kg/m³"),
    sfloat(0x2bd0, "Carbon Monoxide Concentration", "kg/m³"),
    sfloat(0x2bd1, "Methane Concentration", "kg/m³"),
    sfloat(0x2bd2, "Nitrogen Dioxide Concentration", "kg/m³"),
    sfloat(
        0x2bd3,
        "Non-Methane Volatile Organic Compounds Concentration",
        "kg/m³",
    ),
    sfloat(0x2bd4, "Ozone Concentration", "kg/m³"),
    sfloat(0x2bd5, "Particulate Matter - PM1 Concentration", "kg/m³"),
    sfloat(0x2bd6, "Particulate Matter - PM2.5 Concentration", "kg/m³"),
    sfloat(0x2bd7, "Particulate Matter - PM10 Concentration", "kg/m³"),
    sfloat(0x2bd8, "Sulfur Dioxide Concentration", "kg/m³"),
];

const TEXTS: &[TextCodec] = &[
    text(0x2a00, "Device Name"),
    text(0x2a24, "Model Number String"),
    text(0x2a25, "Serial Number String"),
    text(0x2a26, "Firmware Revision String"),
    text(0x2a27, "Hardware Revision String"),
    text(0x2a28, "Software Revision String"),
    text(0x2a29, "Manufacturer Name String"),
    text(0x2a87, "Email Address"),
    text(0x2a8a, "First Name"),
    text(0x2a90, "Last Name"),
    text(0x2aa2, "Language"),
    text(0x2ab5, "Location Name"),
];

const VECTORS: &[VectorCodec] = &[
    VectorCodec {
        uuid: 0x2aa0,
        name: "Magnetic Flux Density - 2D",
        unit: "T",
        template: VectorTemplate::new(MAGNETIC_FLUX, 2),
    },
    VectorCodec {
        uuid: 0x2aa1,
        name: "Magnetic Flux Density - 3D",
        unit: "T",
        template: VectorTemplate::new(MAGNETIC_FLUX, 3),
    },
];

const BYTES: &[BytesCodec] = &[BytesCodec {
    uuid: 0x2a23,
    name: "System ID",
    length: 8,
}];

pub(crate) fn codecs() -> Vec<Arc<dyn CharacteristicCodec>> {
    let mut codecs: Vec<Arc<dyn CharacteristicCodec>> = Vec::new();
    codecs.extend(SCALARS.iter().map(|c| Arc::new(*c) as _));
    codecs.extend(SFLOATS.iter().map(|c| Arc::new(*c) as _));
    codecs.extend(TEXTS.iter().map(|c| Arc::new(*c) as _));
    codecs.extend(VECTORS.iter().map(|c| Arc::new(*c) as _));
    codecs.extend(BYTES.iter().map(|c| Arc::new(*c) as _));
    codecs.push(Arc::new(DateTimeCodec));
    codecs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parse_with;

    fn find(uuid: u16) -> Arc<dyn CharacteristicCodec> {
        codecs()
            .into_iter()
            .find(|codec| codec.uuid() == BluetoothUuid::from_u16(uuid))
            .unwrap()
    }

    #[test]
    fn battery_level() {
        let codec = find(0x2a19);
        let context = CharacteristicContext::new();
        let data = parse_with(codec.as_ref(), None, &[0x55], &context);
        assert!(data.ok());
        assert_eq!(data.value, Some(Value::Unsigned(85)));
        assert_eq!(data.unit, "%");
        assert_eq!(codec.encode(&Value::Unsigned(85)).unwrap(), vec![0x55]);
    }

    #[test]
    fn battery_level_out_of_range() {
        let codec = find(0x2a19);
        let data = parse_with(codec.as_ref(), None, &[0x65], &CharacteristicContext::new());
        assert_eq!(
            data.error,
            Some(GattError::OutOfRange {
                value: 101.0,
                min: 0.0,
                max: 100.0
            })
        );
    }

    #[test]
    fn temperature() {
        let codec = find(0x2a6e);
        let context = CharacteristicContext::new();
        let data = parse_with(codec.as_ref(), None, &[0x76, 0x09], &context);
        assert_eq!(data.value, Some(Value::Float(24.22)));
        assert_eq!(data.unit, "°C");
    }

    #[test]
    fn temperature_sentinel() {
        let codec = find(0x2a6e);
        let data = parse_with(
            codec.as_ref(),
            None,
            &[0x00, 0x80],
            &CharacteristicContext::new(),
        );
        assert!(data.ok());
        assert_eq!(data.value, Some(Value::NotPresent));
    }

    #[test]
    fn humidity_sentinel_beats_range() {
        // 0xffff is above the 0..=100 range but must decode as the sentinel.
        let codec = find(0x2a6f);
        let data = parse_with(
            codec.as_ref(),
            None,
            &[0xff, 0xff],
            &CharacteristicContext::new(),
        );
        assert!(data.ok());
        assert_eq!(data.value, Some(Value::NotPresent));
    }

    #[test]
    fn voltage_resolution() {
        let codec = find(0x2b18);
        let data = parse_with(
            codec.as_ref(),
            None,
            &[0x40, 0x00],
            &CharacteristicContext::new(),
        );
        assert_eq!(data.value, Some(Value::Float(1.0)));
    }

    #[test]
    fn gas_concentration_sfloat() {
        let codec = find(0x2bd6);
        // Mantissa 25, exponent -1.
        let data = parse_with(
            codec.as_ref(),
            None,
            &[0x19, 0xf0],
            &CharacteristicContext::new(),
        );
        assert_eq!(data.value, Some(Value::Float(2.5)));
        // NaN decodes to the not-present variant.
        let data = parse_with(
            codec.as_ref(),
            None,
            &[0xff, 0x07],
            &CharacteristicContext::new(),
        );
        assert_eq!(data.value, Some(Value::NotPresent));
    }

    #[test]
    fn device_name_round_trip() {
        let codec = find(0x2a00);
        let data = parse_with(
            codec.as_ref(),
            None,
            b"Thermo Beacon",
            &CharacteristicContext::new(),
        );
        assert_eq!(data.value, Some(Value::Text("Thermo Beacon".to_owned())));
        assert_eq!(
            codec
                .encode(&Value::Text("Thermo Beacon".to_owned()))
                .unwrap(),
            b"Thermo Beacon"
        );
    }

    #[test]
    fn system_id_bytes() {
        let codec = find(0x2a23);
        let raw = [1, 2, 3, 4, 5, 6, 7, 8];
        let data = parse_with(codec.as_ref(), None, &raw, &CharacteristicContext::new());
        assert_eq!(data.value, Some(Value::Bytes(raw.to_vec())));
        assert!(matches!(
            codec.encode(&Value::Bytes(vec![1, 2])),
            Err(GattError::WrongLength { .. })
        ));
    }

    #[test]
    fn magnetic_flux_3d() {
        let codec = find(0x2aa1);
        let data = parse_with(
            codec.as_ref(),
            None,
            &[0x64, 0x00, 0x9c, 0xff, 0x00, 0x00],
            &CharacteristicContext::new(),
        );
        let Some(Value::Vector(components)) = data.value else {
            panic!("expected a vector, got {:?}", data.value);
        };
        assert_eq!(components.len(), 3);
        assert!((components[0] - 1e-5).abs() < 1e-12);
    }

    #[test]
    fn no_duplicate_uuids() {
        let codecs = codecs();
        for (i, codec) in codecs.iter().enumerate() {
            for other in &codecs[i + 1..] {
                assert_ne!(codec.uuid(), other.uuid(), "duplicate {}", codec.uuid());
            }
        }
    }
}
