//! A field-schema-driven codec for characteristics that have a specification
//! supplement entry but no dedicated implementation.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::spec::{CharacteristicSpec, FieldSpec, FieldType};
use crate::template::ieee11073::{Float32, Sfloat};
use crate::template::int::IntTemplate;
use crate::template::text::{UTF16, UTF8};
use crate::template::{round_half_even, Reader};
use crate::types::{Value, ValueType};

/// Decodes by walking the characteristic's declared field list in order.
pub(crate) struct GenericCodec {
    spec: CharacteristicSpec,
    unit: String,
}

impl GenericCodec {
    pub(crate) fn new(spec: CharacteristicSpec, unit: String) -> Self {
        Self { spec, unit }
    }

    fn decode_field(field: &FieldSpec, reader: &mut Reader) -> Result<Value, GattError> {
        match field.data_type {
            FieldType::Utf8 => Ok(Value::Text(UTF8.decode(reader.rest())?)),
            FieldType::Utf16 => Ok(Value::Text(UTF16.decode(reader.rest())?)),
            FieldType::Boolean => Ok(Value::Bool(reader.u8()? != 0)),
            FieldType::Sfloat => Ok(reader.sfloat()?.into_value()),
            FieldType::Float32 => Ok(Float32::decode_raw(reader.u32()?).into_value()),
            _ => {
                let template = IntTemplate::new(field.size_bytes, field.data_type.signed());
                let raw = template.read(reader)?;
                match (field.resolution, field.offset) {
                    (None, None) => Ok(if field.data_type.signed() {
                        Value::Signed(raw)
                    } else {
                        Value::Unsigned(raw as u64)
                    }),
                    (resolution, offset) => Ok(Value::Float(
                        raw as f64 * resolution.unwrap_or(1.0) + offset.unwrap_or(0.0),
                    )),
                }
            }
        }
    }

    fn field_float(field: &FieldSpec, reader: &mut Reader) -> Result<Option<f64>, GattError> {
        Ok(match Self::decode_field(field, reader)? {
            Value::Float(value) => Some(value),
            Value::Signed(value) => Some(value as f64),
            Value::Unsigned(value) => Some(value as f64),
            Value::Bool(value) => Some(value.into()),
            _ => None,
        })
    }

    fn encode_field(field: &FieldSpec, value: &Value) -> Result<Vec<u8>, GattError> {
        match field.data_type {
            FieldType::Utf8 => match value {
                Value::Text(text) => UTF8.encode(text),
                other => Err(type_mismatch(ValueType::Text, other)),
            },
            FieldType::Utf16 => match value {
                Value::Text(text) => UTF16.encode(text),
                other => Err(type_mismatch(ValueType::Text, other)),
            },
            FieldType::Boolean => match value {
                Value::Bool(value) => Ok(vec![(*value).into()]),
                other => Err(type_mismatch(ValueType::Numeric, other)),
            },
            FieldType::Sfloat => match value {
                Value::Float(value) => Sfloat::encode(*value),
                Value::NotPresent => Sfloat::encode(f64::NAN),
                other => Err(type_mismatch(ValueType::Numeric, other)),
            },
            FieldType::Float32 => match value {
                Value::Float(value) => Float32::encode(*value),
                Value::NotPresent => Float32::encode(f64::NAN),
                other => Err(type_mismatch(ValueType::Numeric, other)),
            },
            _ => {
                let template = IntTemplate::new(field.size_bytes, field.data_type.signed());
                let raw = match value {
                    Value::Unsigned(raw) => *raw as i64,
                    Value::Signed(raw) => *raw,
                    Value::Float(value) => {
                        let scaled = (value - field.offset.unwrap_or(0.0))
                            / field.resolution.unwrap_or(1.0);
                        let raw = round_half_even(scaled);
                        if !raw.is_finite()
                            || raw < template.min() as f64
                            || raw > template.max() as f64
                        {
                            return Err(GattError::OutOfRange {
                                value: *value,
                                min: template.min() as f64,
                                max: template.max() as f64,
                            });
                        }
                        raw as i64
                    }
                    other => return Err(type_mismatch(ValueType::Numeric, other)),
                };
                template.encode(raw)
            }
        }
    }
}

fn type_mismatch(expected: ValueType, actual: &Value) -> GattError {
    GattError::TypeMismatch {
        expected,
        actual: actual.value_type(),
    }
}

impl CharacteristicCodec for GenericCodec {
    fn uuid(&self) -> BluetoothUuid {
        self.spec.uuid
    }

    fn name(&self) -> &str {
        &self.spec.name
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn constraints(&self) -> Constraints {
        let fixed: Option<usize> = self
            .spec
            .fields
            .iter()
            .map(|field| {
                if field.optional || field.data_type.size().is_none() {
                    None
                } else {
                    Some(field.size_bytes)
                }
            })
            .sum();
        match fixed {
            Some(length) if !self.spec.fields.is_empty() => Constraints::exact(length),
            _ => Constraints::NONE,
        }
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        let mut reader = Reader::new(data);
        match self.spec.fields.len() {
            0 => Ok(Value::Bytes(data.to_owned())),
            1 => {
                let value = Self::decode_field(&self.spec.fields[0], &mut reader)?;
                reader.finish()?;
                Ok(value)
            }
            _ => {
                let mut components = Vec::with_capacity(self.spec.fields.len());
                for field in &self.spec.fields {
                    match Self::field_float(field, &mut reader)? {
                        Some(component) => components.push(component),
                        // A non-numeric field makes the aggregate opaque.
                        None => return Ok(Value::Bytes(data.to_owned())),
                    }
                }
                reader.finish()?;
                Ok(Value::Vector(components))
            }
        }
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match self.spec.fields.len() {
            0 => match value {
                Value::Bytes(bytes) => Ok(bytes.clone()),
                other => Err(type_mismatch(ValueType::Bytes, other)),
            },
            1 => Self::encode_field(&self.spec.fields[0], value),
            _ => match value {
                Value::Vector(components) if components.len() == self.spec.fields.len() => {
                    let mut data = Vec::new();
                    for (field, component) in self.spec.fields.iter().zip(components) {
                        data.extend_from_slice(&Self::encode_field(
                            field,
                            &Value::Float(*component),
                        )?);
                    }
                    Ok(data)
                }
                Value::Bytes(bytes) => Ok(bytes.clone()),
                other => Err(type_mismatch(ValueType::Structured, other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_power_spec() -> CharacteristicSpec {
        CharacteristicSpec {
            uuid: BluetoothUuid::from_u16(0x2a07),
            name: "Tx Power Level".to_owned(),
            id: "org.bluetooth.characteristic.tx_power_level".to_owned(),
            fields: vec![FieldSpec {
                name: "Tx Power".to_owned(),
                data_type: FieldType::SInt8,
                size_bytes: 1,
                unit_id: None,
                resolution: None,
                offset: None,
                optional: false,
                min_value: Some(-100.0),
                max_value: Some(20.0),
            }],
            value_type: ValueType::Numeric,
            required_descriptors: vec![],
        }
    }

    #[test]
    fn decode_single_signed_field() {
        let codec = GenericCodec::new(tx_power_spec(), String::new());
        let context = CharacteristicContext::new();
        assert_eq!(codec.decode(&[0xfc], &context).unwrap(), Value::Signed(-4));
        assert_eq!(codec.constraints().expected_length, Some(1));
    }

    #[test]
    fn encode_single_signed_field() {
        let codec = GenericCodec::new(tx_power_spec(), String::new());
        assert_eq!(codec.encode(&Value::Signed(-4)).unwrap(), vec![0xfc]);
    }

    #[test]
    fn scaled_field_decodes_to_float() {
        let mut spec = tx_power_spec();
        spec.fields[0].resolution = Some(0.5);
        let codec = GenericCodec::new(spec, String::new());
        let context = CharacteristicContext::new();
        assert_eq!(codec.decode(&[0x05], &context).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn empty_schema_decodes_to_bytes() {
        let mut spec = tx_power_spec();
        spec.fields.clear();
        let codec = GenericCodec::new(spec, String::new());
        let context = CharacteristicContext::new();
        assert_eq!(
            codec.decode(&[0x01, 0x02], &context).unwrap(),
            Value::Bytes(vec![0x01, 0x02])
        );
    }
}
