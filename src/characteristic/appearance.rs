//! The Appearance characteristic, resolved through the appearance
//! sub-registry.

use crate::assigned;
use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::int::UINT16;
use crate::types::{Value, ValueType};
use std::fmt::{self, Display, Formatter};

/// A decoded Appearance value: `category << 6 | subcategory`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Appearance {
    pub raw: u16,
    /// Category name, e.g. "Heart Rate Sensor".
    pub category: String,
    /// Subcategory name, e.g. "Heart Rate Belt", when one is assigned.
    pub subcategory: Option<String>,
}

impl Appearance {
    /// Resolves a raw appearance value against the assigned-numbers table.
    pub fn from_raw(raw: u16) -> Self {
        let category_value = raw >> 6;
        let subcategory_value = raw & 0x3f;
        let entry = assigned::appearance_values()
            .iter()
            .find(|category| category.category == category_value);
        let category = entry
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| "Unknown".to_owned());
        let subcategory = entry.and_then(|entry| {
            entry
                .subcategories
                .iter()
                .find(|(value, _)| *value == subcategory_value)
                .map(|(_, name)| name.clone())
        });
        Self {
            raw,
            category,
            subcategory,
        }
    }
}

impl Display for Appearance {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.subcategory {
            Some(subcategory) => write!(f, "{}: {}", self.category, subcategory),
            None => f.write_str(&self.category),
        }
    }
}

pub(crate) struct AppearanceCodec;

impl CharacteristicCodec for AppearanceCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a01)
    }

    fn name(&self) -> &str {
        "Appearance"
    }

    fn constraints(&self) -> Constraints {
        Constraints::exact(2).typed(ValueType::Enumeration)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        let raw = UINT16.decode(data)? as u16;
        Ok(Value::Appearance(Appearance::from_raw(raw)))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Appearance(appearance) => UINT16.encode(appearance.raw.into()),
            // A plain number is accepted too, since callers often only have
            // the assigned value.
            Value::Unsigned(raw) => UINT16.encode(*raw as i64),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Enumeration,
                actual: other.value_type(),
            }),
        }
    }
}
