//! Glucose Measurement and Glucose Measurement Context characteristics.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::ieee11073::Sfloat;
use crate::template::time::DateTime;
use crate::template::Reader;
use crate::types::{Value, ValueType};
use bitflags::bitflags;
use log::warn;
use num_enum::IntoPrimitive;
use std::fmt::{self, Display, Formatter};

pub(crate) const GLUCOSE_MEASUREMENT_UUID: BluetoothUuid = BluetoothUuid::from_u16(0x2a18);

const FLAG_TIME_OFFSET: u8 = 0x01;
const FLAG_CONCENTRATION: u8 = 0x02;
const FLAG_MOL_PER_L: u8 = 0x04;
const FLAG_SENSOR_STATUS: u8 = 0x08;
const FLAG_CONTEXT_FOLLOWS: u8 = 0x10;
const FLAGS_RESERVED: u8 = 0xe0;

const CONTEXT_FLAG_CARBOHYDRATE: u8 = 0x01;
const CONTEXT_FLAG_MEAL: u8 = 0x02;
const CONTEXT_FLAG_TESTER_HEALTH: u8 = 0x04;
const CONTEXT_FLAG_EXERCISE: u8 = 0x08;
const CONTEXT_FLAG_MEDICATION: u8 = 0x10;
const CONTEXT_FLAG_MEDICATION_LITRES: u8 = 0x20;
const CONTEXT_FLAG_HBA1C: u8 = 0x40;
const CONTEXT_FLAG_EXTENDED: u8 = 0x80;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConcentrationUnit {
    KgPerLitre,
    MolPerLitre,
}

impl Display for ConcentrationUnit {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::KgPerLitre => f.write_str("kg/L"),
            Self::MolPerLitre => f.write_str("mol/L"),
        }
    }
}

/// The fluid the glucose sample was taken from (lower nibble of the
/// type-and-location byte).
#[derive(Copy, Clone, Debug, Eq, IntoPrimitive, PartialEq)]
#[repr(u8)]
pub enum GlucoseSampleType {
    CapillaryWholeBlood = 1,
    CapillaryPlasma = 2,
    VenousWholeBlood = 3,
    VenousPlasma = 4,
    ArterialWholeBlood = 5,
    ArterialPlasma = 6,
    UndeterminedWholeBlood = 7,
    UndeterminedPlasma = 8,
    InterstitialFluid = 9,
    ControlSolution = 10,
}

impl TryFrom<u8> for GlucoseSampleType {
    type Error = GattError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::CapillaryWholeBlood),
            2 => Ok(Self::CapillaryPlasma),
            3 => Ok(Self::VenousWholeBlood),
            4 => Ok(Self::VenousPlasma),
            5 => Ok(Self::ArterialWholeBlood),
            6 => Ok(Self::ArterialPlasma),
            7 => Ok(Self::UndeterminedWholeBlood),
            8 => Ok(Self::UndeterminedPlasma),
            9 => Ok(Self::InterstitialFluid),
            10 => Ok(Self::ControlSolution),
            _ => Err(GattError::UnknownEnumValue {
                value: value.into(),
            }),
        }
    }
}

/// Where the glucose sample was taken (upper nibble of the type-and-location
/// byte).
#[derive(Copy, Clone, Debug, Eq, IntoPrimitive, PartialEq)]
#[repr(u8)]
pub enum GlucoseSampleLocation {
    Finger = 1,
    AlternateSiteTest = 2,
    Earlobe = 3,
    ControlSolution = 4,
    NotAvailable = 15,
}

impl TryFrom<u8> for GlucoseSampleLocation {
    type Error = GattError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Finger),
            2 => Ok(Self::AlternateSiteTest),
            3 => Ok(Self::Earlobe),
            4 => Ok(Self::ControlSolution),
            15 => Ok(Self::NotAvailable),
            _ => Err(GattError::UnknownEnumValue {
                value: value.into(),
            }),
        }
    }
}

bitflags! {
    /// Sensor status annunciation bits.
    pub struct GlucoseSensorStatus: u16 {
        const BATTERY_LOW = 0x0001;
        const SENSOR_MALFUNCTION = 0x0002;
        const SAMPLE_SIZE_INSUFFICIENT = 0x0004;
        const STRIP_INSERTION_ERROR = 0x0008;
        const STRIP_TYPE_INCORRECT = 0x0010;
        const RESULT_TOO_HIGH = 0x0020;
        const RESULT_TOO_LOW = 0x0040;
        const TEMPERATURE_TOO_HIGH = 0x0080;
        const TEMPERATURE_TOO_LOW = 0x0100;
        const READ_INTERRUPTED = 0x0200;
        const GENERAL_DEVICE_FAULT = 0x0400;
        const TIME_FAULT = 0x0800;
    }
}

/// The concentration block of a glucose measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct GlucoseConcentration {
    pub value: f64,
    pub unit: ConcentrationUnit,
    pub sample_type: GlucoseSampleType,
    pub sample_location: GlucoseSampleLocation,
}

/// A decoded Glucose Measurement value.
#[derive(Clone, Debug, PartialEq)]
pub struct GlucoseMeasurement {
    pub sequence_number: u16,
    pub base_time: DateTime,
    /// Offset from the base time in minutes, when the device reports one.
    pub time_offset_minutes: Option<i16>,
    pub concentration: Option<GlucoseConcentration>,
    pub sensor_status: Option<GlucoseSensorStatus>,
    /// Whether a Glucose Measurement Context with the same sequence number
    /// follows.
    pub context_follows: bool,
}

impl Display for GlucoseMeasurement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "#{}", self.sequence_number)?;
        if let Some(concentration) = &self.concentration {
            write!(f, ": {}{}", concentration.value, concentration.unit)?;
        }
        Ok(())
    }
}

impl GlucoseMeasurement {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let flags = reader.u8()?;
        if flags & FLAGS_RESERVED != 0 {
            warn!(
                "{}",
                GattError::ReservedFlags {
                    flags: (flags & FLAGS_RESERVED).into()
                }
            );
        }

        let sequence_number = reader.u16()?;
        let base_time = DateTime::read(&mut reader)?;
        let time_offset_minutes = if flags & FLAG_TIME_OFFSET != 0 {
            Some(reader.i16()?)
        } else {
            None
        };
        let concentration = if flags & FLAG_CONCENTRATION != 0 {
            let value = reader.sfloat()?.value();
            let type_location = reader.u8()?;
            let sample_type = (type_location & 0x0f).try_into()?;
            let sample_location = (type_location >> 4).try_into()?;
            value.map(|value| GlucoseConcentration {
                value,
                unit: if flags & FLAG_MOL_PER_L != 0 {
                    ConcentrationUnit::MolPerLitre
                } else {
                    ConcentrationUnit::KgPerLitre
                },
                sample_type,
                sample_location,
            })
        } else {
            None
        };
        let sensor_status = if flags & FLAG_SENSOR_STATUS != 0 {
            Some(GlucoseSensorStatus::from_bits_truncate(reader.u16()?))
        } else {
            None
        };
        let context_follows = flags & FLAG_CONTEXT_FOLLOWS != 0;
        reader.finish()?;

        Ok(Self {
            sequence_number,
            base_time,
            time_offset_minutes,
            concentration,
            sensor_status,
            context_follows,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.time_offset_minutes.is_some() {
            flags |= FLAG_TIME_OFFSET;
        }
        if let Some(concentration) = &self.concentration {
            flags |= FLAG_CONCENTRATION;
            if concentration.unit == ConcentrationUnit::MolPerLitre {
                flags |= FLAG_MOL_PER_L;
            }
        }
        if self.sensor_status.is_some() {
            flags |= FLAG_SENSOR_STATUS;
        }
        if self.context_follows {
            flags |= FLAG_CONTEXT_FOLLOWS;
        }
        let mut data = vec![flags];
        data.extend_from_slice(&self.sequence_number.to_le_bytes());
        data.extend_from_slice(&self.base_time.encode()?);
        if let Some(offset) = self.time_offset_minutes {
            data.extend_from_slice(&offset.to_le_bytes());
        }
        if let Some(concentration) = &self.concentration {
            data.extend_from_slice(&Sfloat::encode(concentration.value)?);
            let sample_type: u8 = concentration.sample_type.into();
            let sample_location: u8 = concentration.sample_location.into();
            data.push(sample_location << 4 | sample_type);
        }
        if let Some(status) = self.sensor_status {
            data.extend_from_slice(&status.bits().to_le_bytes());
        }
        Ok(data)
    }
}

/// When a meal was eaten relative to the measurement.
#[derive(Copy, Clone, Debug, Eq, IntoPrimitive, PartialEq)]
#[repr(u8)]
pub enum Meal {
    Preprandial = 1,
    Postprandial = 2,
    Fasting = 3,
    Casual = 4,
    Bedtime = 5,
}

impl TryFrom<u8> for Meal {
    type Error = GattError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Preprandial),
            2 => Ok(Self::Postprandial),
            3 => Ok(Self::Fasting),
            4 => Ok(Self::Casual),
            5 => Ok(Self::Bedtime),
            _ => Err(GattError::UnknownEnumValue {
                value: value.into(),
            }),
        }
    }
}

/// A decoded Glucose Measurement Context value.
///
/// The sequence number ties the context to the Glucose Measurement it
/// annotates; decoding validates it against the measurement in the parse
/// context.
#[derive(Clone, Debug, PartialEq)]
pub struct GlucoseMeasurementContext {
    pub sequence_number: u16,
    /// Carbohydrate ID and amount in kilograms.
    pub carbohydrate: Option<(u8, f64)>,
    pub meal: Option<Meal>,
    /// Tester nibble: 1 self, 2 health care professional, 3 lab test, 15 not
    /// available.
    pub tester: Option<u8>,
    /// Health nibble: 1 minor issues, 2 major issues, 3 during menses,
    /// 4 under stress, 5 none, 15 not available.
    pub health: Option<u8>,
    /// Exercise duration in seconds (65535 = overrun) and intensity in
    /// percent.
    pub exercise: Option<(u16, u8)>,
    /// Medication ID and amount, in kilograms or litres.
    pub medication: Option<(u8, f64, MedicationUnit)>,
    /// Glycated haemoglobin, in percent.
    pub hba1c: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MedicationUnit {
    Kilograms,
    Litres,
}

impl Display for GlucoseMeasurementContext {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "context #{}", self.sequence_number)?;
        if let Some(meal) = self.meal {
            write!(f, ", {meal:?}")?;
        }
        if let Some(hba1c) = self.hba1c {
            write!(f, ", HbA1c {hba1c}%")?;
        }
        Ok(())
    }
}

impl GlucoseMeasurementContext {
    pub(crate) fn decode(
        data: &[u8],
        context: &CharacteristicContext,
    ) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let flags = reader.u8()?;
        let sequence_number = reader.u16()?;
        if flags & CONTEXT_FLAG_EXTENDED != 0 {
            let extended = reader.u8()?;
            if extended != 0 {
                warn!(
                    "{}",
                    GattError::ReservedFlags {
                        flags: extended.into()
                    }
                );
            }
        }
        match context.peer(GLUCOSE_MEASUREMENT_UUID) {
            Some(peer) => match &peer.value {
                Some(Value::Glucose(measurement))
                    if measurement.sequence_number == sequence_number => {}
                Some(Value::Glucose(measurement)) => {
                    return Err(GattError::ContextMismatch(format!(
                        "context sequence number {sequence_number} does not match measurement {}",
                        measurement.sequence_number
                    )));
                }
                _ => {
                    return Err(GattError::ContextMismatch(
                        "peer Glucose Measurement did not decode".to_owned(),
                    ));
                }
            },
            None => {
                return Err(GattError::ContextMismatch(
                    "no Glucose Measurement available in context".to_owned(),
                ));
            }
        }

        let carbohydrate = if flags & CONTEXT_FLAG_CARBOHYDRATE != 0 {
            let id = reader.u8()?;
            let amount = reader.sfloat()?.value();
            amount.map(|amount| (id, amount))
        } else {
            None
        };
        let meal = if flags & CONTEXT_FLAG_MEAL != 0 {
            Some(reader.u8()?.try_into()?)
        } else {
            None
        };
        let (tester, health) = if flags & CONTEXT_FLAG_TESTER_HEALTH != 0 {
            let tester_health = reader.u8()?;
            (Some(tester_health & 0x0f), Some(tester_health >> 4))
        } else {
            (None, None)
        };
        let exercise = if flags & CONTEXT_FLAG_EXERCISE != 0 {
            Some((reader.u16()?, reader.u8()?))
        } else {
            None
        };
        let medication = if flags & CONTEXT_FLAG_MEDICATION != 0 {
            let id = reader.u8()?;
            let amount = reader.sfloat()?.value();
            let unit = if flags & CONTEXT_FLAG_MEDICATION_LITRES != 0 {
                MedicationUnit::Litres
            } else {
                MedicationUnit::Kilograms
            };
            amount.map(|amount| (id, amount, unit))
        } else {
            None
        };
        let hba1c = if flags & CONTEXT_FLAG_HBA1C != 0 {
            reader.sfloat()?.value()
        } else {
            None
        };
        reader.finish()?;

        Ok(Self {
            sequence_number,
            carbohydrate,
            meal,
            tester,
            health,
            exercise,
            medication,
            hba1c,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.carbohydrate.is_some() {
            flags |= CONTEXT_FLAG_CARBOHYDRATE;
        }
        if self.meal.is_some() {
            flags |= CONTEXT_FLAG_MEAL;
        }
        if self.tester.is_some() || self.health.is_some() {
            flags |= CONTEXT_FLAG_TESTER_HEALTH;
        }
        if self.exercise.is_some() {
            flags |= CONTEXT_FLAG_EXERCISE;
        }
        if let Some((_, _, unit)) = self.medication {
            flags |= CONTEXT_FLAG_MEDICATION;
            if unit == MedicationUnit::Litres {
                flags |= CONTEXT_FLAG_MEDICATION_LITRES;
            }
        }
        if self.hba1c.is_some() {
            flags |= CONTEXT_FLAG_HBA1C;
        }
        let mut data = vec![flags];
        data.extend_from_slice(&self.sequence_number.to_le_bytes());
        if let Some((id, amount)) = self.carbohydrate {
            data.push(id);
            data.extend_from_slice(&Sfloat::encode(amount)?);
        }
        if let Some(meal) = self.meal {
            data.push(meal.into());
        }
        if flags & CONTEXT_FLAG_TESTER_HEALTH != 0 {
            data.push(self.health.unwrap_or(15) << 4 | (self.tester.unwrap_or(15) & 0x0f));
        }
        if let Some((duration, intensity)) = self.exercise {
            data.extend_from_slice(&duration.to_le_bytes());
            data.push(intensity);
        }
        if let Some((id, amount, _)) = self.medication {
            data.push(id);
            data.extend_from_slice(&Sfloat::encode(amount)?);
        }
        if let Some(hba1c) = self.hba1c {
            data.extend_from_slice(&Sfloat::encode(hba1c)?);
        }
        Ok(data)
    }
}

pub(crate) struct GlucoseMeasurementCodec;

impl CharacteristicCodec for GlucoseMeasurementCodec {
    fn uuid(&self) -> BluetoothUuid {
        GLUCOSE_MEASUREMENT_UUID
    }

    fn name(&self) -> &str {
        "Glucose Measurement"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(10, 17).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::Glucose(GlucoseMeasurement::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Glucose(measurement) => measurement.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct GlucoseMeasurementContextCodec;

impl CharacteristicCodec for GlucoseMeasurementContextCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a34)
    }

    fn name(&self) -> &str {
        "Glucose Measurement Context"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(3, 17).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], context: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::GlucoseContext(GlucoseMeasurementContext::decode(
            data, context,
        )?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::GlucoseContext(context) => context.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }

    fn required_dependencies(&self) -> Vec<BluetoothUuid> {
        vec![GLUCOSE_MEASUREMENT_UUID]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CharacteristicData;

    fn base_time() -> DateTime {
        DateTime {
            year: 2024,
            month: 3,
            day: 1,
            hour: 12,
            minute: 30,
            second: 5,
        }
    }

    fn measurement_bytes() -> Vec<u8> {
        // Flags: concentration present, kg/L. Sequence 7.
        let mut data = vec![0x02, 0x07, 0x00];
        data.extend_from_slice(&base_time().encode().unwrap());
        // 0.0055 kg/L: mantissa 55, exponent -4.
        data.extend_from_slice(&[0x37, 0xc0]);
        // Capillary whole blood, finger.
        data.push(0x11);
        data
    }

    fn context_with_measurement(sequence_number: u16) -> CharacteristicContext {
        let measurement = GlucoseMeasurement {
            sequence_number,
            base_time: base_time(),
            time_offset_minutes: None,
            concentration: None,
            sensor_status: None,
            context_follows: true,
        };
        let mut context = CharacteristicContext::new();
        context.insert_peer(CharacteristicData::success(
            GLUCOSE_MEASUREMENT_UUID,
            "Glucose Measurement",
            Value::Glucose(measurement),
            "",
            &[],
        ));
        context
    }

    #[test]
    fn decode_measurement() {
        let decoded = GlucoseMeasurement::decode(&measurement_bytes()).unwrap();
        assert_eq!(decoded.sequence_number, 7);
        assert_eq!(decoded.base_time, base_time());
        let concentration = decoded.concentration.unwrap();
        assert_eq!(concentration.sample_type, GlucoseSampleType::CapillaryWholeBlood);
        assert_eq!(concentration.sample_location, GlucoseSampleLocation::Finger);
        assert_eq!(concentration.unit, ConcentrationUnit::KgPerLitre);
        assert!((concentration.value - 0.0055).abs() < 1e-12);
    }

    #[test]
    fn measurement_round_trip() {
        let measurement = GlucoseMeasurement {
            sequence_number: 41,
            base_time: base_time(),
            time_offset_minutes: Some(-60),
            concentration: Some(GlucoseConcentration {
                value: 0.5,
                unit: ConcentrationUnit::MolPerLitre,
                sample_type: GlucoseSampleType::VenousPlasma,
                sample_location: GlucoseSampleLocation::Earlobe,
            }),
            sensor_status: Some(GlucoseSensorStatus::BATTERY_LOW),
            context_follows: false,
        };
        assert_eq!(
            GlucoseMeasurement::decode(&measurement.encode().unwrap()).unwrap(),
            measurement
        );
    }

    #[test]
    fn context_requires_matching_sequence_number() {
        // Sequence number 7, meal field present.
        let data = [0x02, 0x07, 0x00, 0x02];
        let decoded =
            GlucoseMeasurementContext::decode(&data, &context_with_measurement(7)).unwrap();
        assert_eq!(decoded.sequence_number, 7);
        assert_eq!(decoded.meal, Some(Meal::Postprandial));

        assert!(matches!(
            GlucoseMeasurementContext::decode(&data, &context_with_measurement(8)),
            Err(GattError::ContextMismatch(_))
        ));
        assert!(matches!(
            GlucoseMeasurementContext::decode(&data, &CharacteristicContext::new()),
            Err(GattError::ContextMismatch(_))
        ));
    }

    #[test]
    fn context_round_trip() {
        let context_value = GlucoseMeasurementContext {
            sequence_number: 7,
            carbohydrate: Some((1, 0.05)),
            meal: Some(Meal::Preprandial),
            tester: Some(1),
            health: Some(5),
            exercise: Some((1800, 70)),
            medication: Some((2, 0.0005, MedicationUnit::Litres)),
            hba1c: Some(5.5),
        };
        let encoded = context_value.encode().unwrap();
        assert_eq!(
            GlucoseMeasurementContext::decode(&encoded, &context_with_measurement(7)).unwrap(),
            context_value
        );
    }
}
