//! Decoded characteristic values and the result type returned by every parse.

use crate::bleuuid::BluetoothUuid;
use crate::characteristic::appearance::Appearance;
use crate::characteristic::blood_pressure::BloodPressureMeasurement;
use crate::characteristic::control_point::{
    AlertNotificationCommand, BondManagementCommand, RingerCommand, TimeUpdateCommand,
};
use crate::characteristic::cycling::{CscMeasurement, CyclingPowerCommand, CyclingPowerMeasurement};
use crate::characteristic::features::FeatureSet;
use crate::characteristic::glucose::{GlucoseMeasurement, GlucoseMeasurementContext};
use crate::characteristic::heart_rate::HeartRateMeasurement;
use crate::characteristic::location::{LnCommand, LocationAndSpeed, Navigation};
use crate::characteristic::pulse_oximetry::{PlxContinuous, PlxFeatures, PlxSpotCheck};
use crate::characteristic::running_speed::RscMeasurement;
use crate::characteristic::thermometer::TemperatureMeasurement;
use crate::characteristic::weight::{BodyCompositionMeasurement, WeightMeasurement};
use crate::error::GattError;
use crate::template::time::DateTime;
use std::fmt::{self, Display, Formatter};

/// The semantic category of a characteristic's value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ValueType {
    Numeric,
    Structured,
    Text,
    Bitmap,
    Enumeration,
    Bytes,
    Unknown,
}

/// A raw enumeration value together with its resolved name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnumValue {
    pub raw: u32,
    pub name: &'static str,
}

impl Display for EnumValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A decoded characteristic value.
///
/// Simple characteristics decode to one of the scalar variants; flag-driven
/// characteristics decode to a structured record type. A sentinel raw value
/// ("value is not known") decodes to [`Value::NotPresent`] rather than being
/// reported as a number.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    /// Fixed number of equally scaled components, e.g. a 3-axis magnetic field.
    Vector(Vec<f64>),
    Enum(EnumValue),
    DateTime(DateTime),
    /// The sentinel "value not present / unknown" code declared by the
    /// characteristic, e.g. 0xffff for an unknown pulse rate.
    NotPresent,
    HeartRate(HeartRateMeasurement),
    TemperatureMeasurement(TemperatureMeasurement),
    BloodPressure(BloodPressureMeasurement),
    Glucose(GlucoseMeasurement),
    GlucoseContext(GlucoseMeasurementContext),
    CyclingPower(CyclingPowerMeasurement),
    Csc(CscMeasurement),
    Rsc(RscMeasurement),
    Weight(WeightMeasurement),
    BodyComposition(BodyCompositionMeasurement),
    PlxSpotCheck(PlxSpotCheck),
    PlxContinuous(PlxContinuous),
    PlxFeaturesValue(PlxFeatures),
    LocationAndSpeed(LocationAndSpeed),
    Navigation(Navigation),
    Features(FeatureSet),
    Appearance(Appearance),
    CyclingPowerControl(CyclingPowerCommand),
    LnControl(LnCommand),
    BondManagementControl(BondManagementCommand),
    TimeUpdateControl(TimeUpdateCommand),
    AlertNotificationControl(AlertNotificationCommand),
    RingerControl(RingerCommand),
}

impl Value {
    /// The semantic category of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Unsigned(_) | Self::Signed(_) | Self::Float(_) | Self::Bool(_) => {
                ValueType::Numeric
            }
            Self::Text(_) => ValueType::Text,
            Self::Bytes(_) => ValueType::Bytes,
            Self::Enum(_) => ValueType::Enumeration,
            Self::Features(_) => ValueType::Bitmap,
            Self::NotPresent => ValueType::Unknown,
            Self::Vector(_) | Self::DateTime(_) => ValueType::Structured,
            _ => ValueType::Structured,
        }
    }

    /// The value as an integer, if it is integral.
    pub fn value_int(&self) -> Option<i64> {
        match self {
            &Self::Unsigned(value) => value.try_into().ok(),
            &Self::Signed(value) => Some(value),
            &Self::Bool(value) => Some(value.into()),
            &Self::Enum(EnumValue { raw, .. }) => Some(raw.into()),
            &Self::Appearance(Appearance { raw, .. }) => Some(raw.into()),
            Self::Features(features) => features.raw.try_into().ok(),
            _ => None,
        }
    }

    /// The value as a float, if it is numeric.
    pub fn value_float(&self) -> Option<f64> {
        match self {
            &Self::Float(value) => Some(value),
            &Self::Unsigned(value) => Some(value as f64),
            &Self::Signed(value) => Some(value as f64),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Unsigned(value) => value.fmt(f),
            Self::Signed(value) => value.fmt(f),
            Self::Float(value) => value.fmt(f),
            Self::Bool(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
            Self::Bytes(value) => {
                for byte in value {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Vector(components) => {
                f.write_str("(")?;
                for (i, component) in components.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    component.fmt(f)?;
                }
                f.write_str(")")
            }
            Self::Enum(value) => value.fmt(f),
            Self::DateTime(value) => value.fmt(f),
            Self::NotPresent => f.write_str("not present"),
            Self::HeartRate(value) => value.fmt(f),
            Self::TemperatureMeasurement(value) => value.fmt(f),
            Self::BloodPressure(value) => value.fmt(f),
            Self::Glucose(value) => value.fmt(f),
            Self::GlucoseContext(value) => value.fmt(f),
            Self::CyclingPower(value) => value.fmt(f),
            Self::Csc(value) => value.fmt(f),
            Self::Rsc(value) => value.fmt(f),
            Self::Weight(value) => value.fmt(f),
            Self::BodyComposition(value) => value.fmt(f),
            Self::PlxSpotCheck(value) => value.fmt(f),
            Self::PlxContinuous(value) => value.fmt(f),
            Self::PlxFeaturesValue(value) => value.fmt(f),
            Self::LocationAndSpeed(value) => value.fmt(f),
            Self::Navigation(value) => value.fmt(f),
            Self::Features(value) => value.fmt(f),
            Self::Appearance(value) => value.fmt(f),
            Self::CyclingPowerControl(value) => value.fmt(f),
            Self::LnControl(value) => value.fmt(f),
            Self::BondManagementControl(value) => value.fmt(f),
            Self::TimeUpdateControl(value) => value.fmt(f),
            Self::AlertNotificationControl(value) => value.fmt(f),
            Self::RingerControl(value) => value.fmt(f),
        }
    }
}

/// The outcome of parsing one characteristic value.
///
/// The raw bytes are kept regardless of outcome, so callers can log or retry
/// undecodable values.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacteristicData {
    /// The UUID the value was parsed against.
    pub uuid: BluetoothUuid,
    /// The characteristic's canonical name, if the registry knows it.
    pub name: String,
    /// The decoded value. `None` when decoding failed.
    pub value: Option<Value>,
    /// Display unit of the value, e.g. "%" or "bpm". Empty for unitless values.
    pub unit: String,
    /// The bytes the value was decoded from.
    pub raw_data: Vec<u8>,
    /// The failure, if decoding failed.
    pub error: Option<GattError>,
}

impl CharacteristicData {
    pub(crate) fn success(
        uuid: BluetoothUuid,
        name: &str,
        value: Value,
        unit: &str,
        raw_data: &[u8],
    ) -> Self {
        Self {
            uuid,
            name: name.to_owned(),
            value: Some(value),
            unit: unit.to_owned(),
            raw_data: raw_data.to_owned(),
            error: None,
        }
    }

    pub(crate) fn failure(
        uuid: BluetoothUuid,
        name: &str,
        raw_data: &[u8],
        error: GattError,
    ) -> Self {
        Self {
            uuid,
            name: name.to_owned(),
            value: None,
            unit: String::new(),
            raw_data: raw_data.to_owned(),
            error: Some(error),
        }
    }

    /// True iff the value was decoded and validated successfully.
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

impl Display for CharacteristicData {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.uuid)?;
        } else {
            f.write_str(&self.name)?;
        }
        match (&self.value, &self.error) {
            (Some(value), _) => write!(f, ": {}{}", value, self.unit),
            (None, Some(error)) => write!(f, ": {}", error),
            (None, None) => f.write_str(": <empty>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_categories() {
        assert_eq!(Value::Unsigned(85).value_type(), ValueType::Numeric);
        assert_eq!(Value::Float(24.22).value_type(), ValueType::Numeric);
        assert_eq!(
            Value::Text("serial".to_owned()).value_type(),
            ValueType::Text
        );
        assert_eq!(Value::NotPresent.value_type(), ValueType::Unknown);
    }

    #[test]
    fn int_and_float_accessors() {
        assert_eq!(Value::Unsigned(85).value_int(), Some(85));
        assert_eq!(Value::Signed(-4).value_float(), Some(-4.0));
        assert_eq!(Value::Float(1.5).value_int(), None);
        assert_eq!(Value::NotPresent.value_float(), None);
    }

    #[test]
    fn format_data() {
        let data = CharacteristicData::success(
            BluetoothUuid::from_u16(0x2a19),
            "Battery Level",
            Value::Unsigned(85),
            "%",
            &[0x55],
        );
        assert!(data.ok());
        assert_eq!(data.to_string(), "Battery Level: 85%");
    }
}
