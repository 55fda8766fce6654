//! The codec interface implemented by every characteristic, and the
//! validation pipeline wrapped around each decode.

use crate::bleuuid::BluetoothUuid;
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::spec::CharacteristicSpec;
use crate::types::{CharacteristicData, Value, ValueType};
use std::panic::{self, AssertUnwindSafe};

/// Declarative validation metadata for a characteristic.
///
/// Length constraints are checked before decoding, value constraints after.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Constraints {
    /// The value must be exactly this long.
    pub expected_length: Option<usize>,
    /// Minimum length for variable-length values.
    pub min_length: Option<usize>,
    /// Maximum length for variable-length values.
    pub max_length: Option<usize>,
    /// The decoded value must be of this category.
    pub expected_type: Option<ValueType>,
    /// Smallest acceptable decoded value.
    pub min_value: Option<f64>,
    /// Largest acceptable decoded value.
    pub max_value: Option<f64>,
}

impl Constraints {
    pub const NONE: Self = Self {
        expected_length: None,
        min_length: None,
        max_length: None,
        expected_type: None,
        min_value: None,
        max_value: None,
    };

    pub const fn exact(length: usize) -> Self {
        Self {
            expected_length: Some(length),
            ..Self::NONE
        }
    }

    pub const fn bounded(min: usize, max: usize) -> Self {
        Self {
            min_length: Some(min),
            max_length: Some(max),
            ..Self::NONE
        }
    }

    pub const fn at_least(min: usize) -> Self {
        Self {
            min_length: Some(min),
            ..Self::NONE
        }
    }

    pub const fn typed(self, expected_type: ValueType) -> Self {
        Self {
            expected_type: Some(expected_type),
            ..self
        }
    }

    pub const fn ranged(self, min: f64, max: f64) -> Self {
        Self {
            min_value: Some(min),
            max_value: Some(max),
            ..self
        }
    }
}

/// A decoder/encoder for one characteristic.
///
/// Implementations are stateless; all per-parse state lives in the context.
/// The registry owns one boxed codec per supported UUID.
pub trait CharacteristicCodec: Send + Sync {
    fn uuid(&self) -> BluetoothUuid;

    /// The characteristic's canonical SIG name.
    fn name(&self) -> &str;

    /// Display unit of the decoded value, e.g. "%". Empty when unitless or
    /// when the value is structured.
    fn unit(&self) -> &str {
        ""
    }

    fn constraints(&self) -> Constraints {
        Constraints::NONE
    }

    /// Decodes a value. The context carries sibling values and descriptors;
    /// codecs that do not need it ignore it.
    fn decode(&self, data: &[u8], context: &CharacteristicContext) -> Result<Value, GattError>;

    /// Encodes a value previously produced by `decode` (or constructed by the
    /// caller) back to bytes. Optional fields absent from the value are absent
    /// from the output.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError>;

    /// Whether a custom registration may shadow this codec's UUID.
    fn allows_override(&self) -> bool {
        false
    }

    /// Sibling characteristics that must be in the context for decode to
    /// succeed.
    fn required_dependencies(&self) -> Vec<BluetoothUuid> {
        Vec::new()
    }

    /// Sibling characteristics that refine the decode when available.
    fn optional_dependencies(&self) -> Vec<BluetoothUuid> {
        Vec::new()
    }
}

/// Runs the full decode pipeline for one value.
///
/// Sentinel ("not present") raw values are mapped to [`Value::NotPresent`] by
/// the codec itself before any range check, so a declared sentinel can never
/// be reported as out of range.
pub(crate) fn parse_with(
    codec: &dyn CharacteristicCodec,
    spec: Option<&CharacteristicSpec>,
    data: &[u8],
    context: &CharacteristicContext,
) -> CharacteristicData {
    let constraints = codec.constraints();
    if let Err(error) = check_length(&constraints, data.len()) {
        return CharacteristicData::failure(codec.uuid(), codec.name(), data, error);
    }

    let value = match panic::catch_unwind(AssertUnwindSafe(|| codec.decode(data, context))) {
        Ok(Ok(value)) => value,
        Ok(Err(error)) => {
            return CharacteristicData::failure(codec.uuid(), codec.name(), data, error);
        }
        Err(_) => {
            return CharacteristicData::failure(
                codec.uuid(),
                codec.name(),
                data,
                GattError::Internal(format!("decoder for {} panicked", codec.uuid())),
            );
        }
    };

    if let Some(expected) = constraints.expected_type {
        let actual = value.value_type();
        if value != Value::NotPresent && actual != expected {
            return CharacteristicData::failure(
                codec.uuid(),
                codec.name(),
                data,
                GattError::TypeMismatch { expected, actual },
            );
        }
    }

    if let Some(number) = value.value_float() {
        if let Some((min, max)) = effective_range(&constraints, spec, Some(context)) {
            if number < min || number > max {
                return CharacteristicData::failure(
                    codec.uuid(),
                    codec.name(),
                    data,
                    GattError::OutOfRange {
                        value: number,
                        min,
                        max,
                    },
                );
            }
        }
    }

    CharacteristicData::success(codec.uuid(), codec.name(), value, codec.unit(), data)
}

/// Validates a value against the codec's declared range, then encodes it.
pub(crate) fn encode_with(
    codec: &dyn CharacteristicCodec,
    spec: Option<&CharacteristicSpec>,
    value: &Value,
) -> Result<Vec<u8>, GattError> {
    if let Some(number) = value.value_float() {
        if let Some((min, max)) = effective_range(&codec.constraints(), spec, None) {
            if number < min || number > max {
                return Err(GattError::OutOfRange {
                    value: number,
                    min,
                    max,
                });
            }
        }
    }
    codec.encode(value)
}

fn check_length(constraints: &Constraints, length: usize) -> Result<(), GattError> {
    if let Some(expected_length) = constraints.expected_length {
        if length != expected_length {
            return Err(GattError::WrongLength {
                length,
                expected_length,
            });
        }
        return Ok(());
    }
    let min = constraints.min_length.unwrap_or(0);
    let max = constraints.max_length.unwrap_or(usize::MAX);
    if length < min || length > max {
        return Err(GattError::LengthOutOfBounds { length, min, max });
    }
    Ok(())
}

/// The range in effect for a decode: a Valid Range descriptor wins over the
/// codec's declared range, which wins over the YAML field range.
fn effective_range(
    constraints: &Constraints,
    spec: Option<&CharacteristicSpec>,
    context: Option<&CharacteristicContext>,
) -> Option<(f64, f64)> {
    if let Some(range) = context.and_then(CharacteristicContext::valid_range) {
        return Some(range);
    }
    if let (Some(min), Some(max)) = (constraints.min_value, constraints.max_value) {
        return Some((min, max));
    }
    let field = spec?.fields.first()?;
    if let (Some(min), Some(max)) = (field.min_value, field.max_value) {
        return Some((min, max));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescriptorValue, VALID_RANGE_UUID};

    struct PercentCodec;

    impl CharacteristicCodec for PercentCodec {
        fn uuid(&self) -> BluetoothUuid {
            BluetoothUuid::from_u16(0x2a19)
        }

        fn name(&self) -> &str {
            "Battery Level"
        }

        fn unit(&self) -> &str {
            "%"
        }

        fn constraints(&self) -> Constraints {
            Constraints::exact(1)
                .typed(ValueType::Numeric)
                .ranged(0.0, 100.0)
        }

        fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
            Ok(Value::Unsigned(data[0].into()))
        }

        fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
            match value {
                Value::Unsigned(level) => Ok(vec![*level as u8]),
                other => Err(GattError::TypeMismatch {
                    expected: ValueType::Numeric,
                    actual: other.value_type(),
                }),
            }
        }
    }

    struct PanickingCodec;

    impl CharacteristicCodec for PanickingCodec {
        fn uuid(&self) -> BluetoothUuid {
            BluetoothUuid::from_u16(0xffff)
        }

        fn name(&self) -> &str {
            "Broken"
        }

        fn decode(&self, _: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
            panic!("bug");
        }

        fn encode(&self, _: &Value) -> Result<Vec<u8>, GattError> {
            panic!("bug");
        }
    }

    #[test]
    fn pipeline_success() {
        let data = parse_with(&PercentCodec, None, &[0x55], &CharacteristicContext::new());
        assert!(data.ok());
        assert_eq!(data.value, Some(Value::Unsigned(85)));
        assert_eq!(data.unit, "%");
        assert_eq!(data.raw_data, vec![0x55]);
    }

    #[test]
    fn pipeline_length_check() {
        let data = parse_with(
            &PercentCodec,
            None,
            &[0x55, 0x00],
            &CharacteristicContext::new(),
        );
        assert!(!data.ok());
        assert_eq!(
            data.error,
            Some(GattError::WrongLength {
                length: 2,
                expected_length: 1
            })
        );
        assert_eq!(data.raw_data, vec![0x55, 0x00]);
    }

    #[test]
    fn pipeline_range_check() {
        let data = parse_with(&PercentCodec, None, &[0x65], &CharacteristicContext::new());
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
    fn valid_range_descriptor_wins() {
        let mut context = CharacteristicContext::new();
        context.insert_descriptor(
            VALID_RANGE_UUID,
            DescriptorValue::ValidRange {
                min: 0.0,
                max: 50.0,
            },
        );
        let data = parse_with(&PercentCodec, None, &[0x55], &context);
        assert_eq!(
            data.error,
            Some(GattError::OutOfRange {
                value: 85.0,
                min: 0.0,
                max: 50.0
            })
        );
    }

    #[test]
    fn panic_is_contained() {
        let data = parse_with(
            &PanickingCodec,
            None,
            &[0x00],
            &CharacteristicContext::new(),
        );
        assert!(!data.ok());
        assert!(matches!(data.error, Some(GattError::Internal(_))));
    }

    #[test]
    fn encode_validates_range() {
        assert_eq!(
            encode_with(&PercentCodec, None, &Value::Unsigned(85)).unwrap(),
            vec![0x55]
        );
        assert!(matches!(
            encode_with(&PercentCodec, None, &Value::Unsigned(101)),
            Err(GattError::OutOfRange { .. })
        ));
    }
}
