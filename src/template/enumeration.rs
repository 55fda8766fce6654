//! Enumeration codec: a small integer mapped to a named variant.

use crate::error::GattError;
use crate::template::int::IntTemplate;
use crate::types::EnumValue;

/// What to do with a raw value that is not in the variant table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UnknownPolicy {
    /// Report the value as a variant named "unknown", keeping the raw value.
    Keep,
    /// Reject the value with [`GattError::UnknownEnumValue`].
    Reject,
}

/// An integer-backed enumeration with a static variant table.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnumTemplate {
    int: IntTemplate,
    variants: &'static [(u32, &'static str)],
    unknown: UnknownPolicy,
}

impl EnumTemplate {
    pub const fn new(
        int: IntTemplate,
        variants: &'static [(u32, &'static str)],
        unknown: UnknownPolicy,
    ) -> Self {
        Self {
            int,
            variants,
            unknown,
        }
    }

    pub const fn int(self) -> IntTemplate {
        self.int
    }

    /// The name for a raw value, if it is in the table.
    pub fn name(self, raw: u32) -> Option<&'static str> {
        self.variants
            .iter()
            .find(|(value, _)| *value == raw)
            .map(|(_, name)| *name)
    }

    pub fn decode(self, data: &[u8]) -> Result<EnumValue, GattError> {
        let raw = self.int.decode(data)? as u32;
        match (self.name(raw), self.unknown) {
            (Some(name), _) => Ok(EnumValue { raw, name }),
            (None, UnknownPolicy::Keep) => Ok(EnumValue {
                raw,
                name: "unknown",
            }),
            (None, UnknownPolicy::Reject) => Err(GattError::UnknownEnumValue { value: raw }),
        }
    }

    pub fn encode(self, value: &EnumValue) -> Result<Vec<u8>, GattError> {
        self.int.encode(value.raw.into())
    }
}
