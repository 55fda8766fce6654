//! Weight Measurement and Body Composition Measurement characteristics.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::time::DateTime;
use crate::template::{round_half_even, Reader};
use crate::types::{Value, ValueType};
use log::warn;
use std::fmt::{self, Display, Formatter};

/// 0xffff in a mass or body-fat slot means the measurement was unsuccessful.
const UNSUCCESSFUL: u16 = 0xffff;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MeasurementUnits {
    /// Weight in kilograms (resolution 0.005), height in metres (0.001).
    Si,
    /// Weight in pounds (resolution 0.01), height in inches (0.1).
    Imperial,
}

impl MeasurementUnits {
    fn weight_resolution(self) -> f64 {
        match self {
            Self::Si => 0.005,
            Self::Imperial => 0.01,
        }
    }

    fn height_resolution(self) -> f64 {
        match self {
            Self::Si => 0.001,
            Self::Imperial => 0.1,
        }
    }

    pub fn weight_unit(self) -> &'static str {
        match self {
            Self::Si => "kg",
            Self::Imperial => "lb",
        }
    }
}

const WEIGHT_FLAG_IMPERIAL: u8 = 0x01;
const WEIGHT_FLAG_TIMESTAMP: u8 = 0x02;
const WEIGHT_FLAG_USER_ID: u8 = 0x04;
const WEIGHT_FLAG_BMI_HEIGHT: u8 = 0x08;
const WEIGHT_FLAGS_RESERVED: u8 = 0xf0;

/// A decoded Weight Measurement value.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightMeasurement {
    /// Weight in the declared units; `None` when the scale reported an
    /// unsuccessful measurement.
    pub weight: Option<f64>,
    pub units: MeasurementUnits,
    pub timestamp: Option<DateTime>,
    pub user_id: Option<u8>,
    /// Body mass index in kg/m² and height in the declared units.
    pub bmi_height: Option<(f64, f64)>,
}

impl Display for WeightMeasurement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.weight {
            Some(weight) => write!(f, "{}{}", weight, self.units.weight_unit()),
            None => f.write_str("measurement unsuccessful"),
        }
    }
}

impl WeightMeasurement {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let flags = reader.u8()?;
        if flags & WEIGHT_FLAGS_RESERVED != 0 {
            warn!(
                "{}",
                GattError::ReservedFlags {
                    flags: (flags & WEIGHT_FLAGS_RESERVED).into()
                }
            );
        }
        let units = if flags & WEIGHT_FLAG_IMPERIAL != 0 {
            MeasurementUnits::Imperial
        } else {
            MeasurementUnits::Si
        };
        let raw_weight = reader.u16()?;
        let weight = if raw_weight == UNSUCCESSFUL {
            None
        } else {
            Some(f64::from(raw_weight) * units.weight_resolution())
        };
        let timestamp = if flags & WEIGHT_FLAG_TIMESTAMP != 0 {
            Some(DateTime::read(&mut reader)?)
        } else {
            None
        };
        let user_id = if flags & WEIGHT_FLAG_USER_ID != 0 {
            Some(reader.u8()?)
        } else {
            None
        };
        let bmi_height = if flags & WEIGHT_FLAG_BMI_HEIGHT != 0 {
            let bmi = f64::from(reader.u16()?) * 0.1;
            let height = f64::from(reader.u16()?) * units.height_resolution();
            Some((bmi, height))
        } else {
            None
        };
        reader.finish()?;
        Ok(Self {
            weight,
            units,
            timestamp,
            user_id,
            bmi_height,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.units == MeasurementUnits::Imperial {
            flags |= WEIGHT_FLAG_IMPERIAL;
        }
        if self.timestamp.is_some() {
            flags |= WEIGHT_FLAG_TIMESTAMP;
        }
        if self.user_id.is_some() {
            flags |= WEIGHT_FLAG_USER_ID;
        }
        if self.bmi_height.is_some() {
            flags |= WEIGHT_FLAG_BMI_HEIGHT;
        }
        let mut data = vec![flags];
        match self.weight {
            Some(weight) => data.extend_from_slice(
                &encode_scaled(weight, self.units.weight_resolution())?.to_le_bytes(),
            ),
            None => data.extend_from_slice(&UNSUCCESSFUL.to_le_bytes()),
        }
        if let Some(timestamp) = &self.timestamp {
            data.extend_from_slice(&timestamp.encode()?);
        }
        if let Some(user_id) = self.user_id {
            data.push(user_id);
        }
        if let Some((bmi, height)) = self.bmi_height {
            data.extend_from_slice(&encode_scaled(bmi, 0.1)?.to_le_bytes());
            data.extend_from_slice(
                &encode_scaled(height, self.units.height_resolution())?.to_le_bytes(),
            );
        }
        Ok(data)
    }
}

fn encode_scaled(value: f64, resolution: f64) -> Result<u16, GattError> {
    let raw = round_half_even(value / resolution);
    // 0xffff is the unsuccessful-measurement code, so the largest encodable
    // raw value is one below it.
    if !(0.0..=65534.0).contains(&raw) {
        return Err(GattError::OutOfRange {
            value,
            min: 0.0,
            max: 65534.0 * resolution,
        });
    }
    Ok(raw as u16)
}

const BODY_FLAG_IMPERIAL: u16 = 0x0001;
const BODY_FLAG_TIMESTAMP: u16 = 0x0002;
const BODY_FLAG_USER_ID: u16 = 0x0004;
const BODY_FLAG_BASAL_METABOLISM: u16 = 0x0008;
const BODY_FLAG_MUSCLE_PERCENTAGE: u16 = 0x0010;
const BODY_FLAG_MUSCLE_MASS: u16 = 0x0020;
const BODY_FLAG_FAT_FREE_MASS: u16 = 0x0040;
const BODY_FLAG_SOFT_LEAN_MASS: u16 = 0x0080;
const BODY_FLAG_BODY_WATER_MASS: u16 = 0x0100;
const BODY_FLAG_IMPEDANCE: u16 = 0x0200;
const BODY_FLAG_WEIGHT: u16 = 0x0400;
const BODY_FLAG_HEIGHT: u16 = 0x0800;
const BODY_FLAG_MULTIPLE_PACKET: u16 = 0x1000;
const BODY_FLAGS_RESERVED: u16 = 0xe000;

/// A decoded Body Composition Measurement value.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyCompositionMeasurement {
    /// Body fat percentage; `None` when the measurement was unsuccessful.
    pub body_fat_percent: Option<f64>,
    pub units: MeasurementUnits,
    pub timestamp: Option<DateTime>,
    pub user_id: Option<u8>,
    /// Basal metabolism in kilojoules.
    pub basal_metabolism: Option<u16>,
    pub muscle_percent: Option<f64>,
    pub muscle_mass: Option<f64>,
    pub fat_free_mass: Option<f64>,
    pub soft_lean_mass: Option<f64>,
    pub body_water_mass: Option<f64>,
    /// Impedance in ohms.
    pub impedance: Option<f64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub multiple_packet: bool,
}

impl Display for BodyCompositionMeasurement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.body_fat_percent {
            Some(fat) => write!(f, "{fat}% body fat"),
            None => f.write_str("measurement unsuccessful"),
        }
    }
}

impl BodyCompositionMeasurement {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let flags = reader.u16()?;
        if flags & BODY_FLAGS_RESERVED != 0 {
            warn!(
                "{}",
                GattError::ReservedFlags {
                    flags: (flags & BODY_FLAGS_RESERVED).into()
                }
            );
        }
        let units = if flags & BODY_FLAG_IMPERIAL != 0 {
            MeasurementUnits::Imperial
        } else {
            MeasurementUnits::Si
        };
        let raw_fat = reader.u16()?;
        let body_fat_percent = if raw_fat == UNSUCCESSFUL {
            None
        } else {
            Some(f64::from(raw_fat) * 0.1)
        };
        let timestamp = if flags & BODY_FLAG_TIMESTAMP != 0 {
            Some(DateTime::read(&mut reader)?)
        } else {
            None
        };
        let user_id = if flags & BODY_FLAG_USER_ID != 0 {
            Some(reader.u8()?)
        } else {
            None
        };
        let basal_metabolism = if flags & BODY_FLAG_BASAL_METABOLISM != 0 {
            Some(reader.u16()?)
        } else {
            None
        };
        let muscle_percent = if flags & BODY_FLAG_MUSCLE_PERCENTAGE != 0 {
            Some(f64::from(reader.u16()?) * 0.1)
        } else {
            None
        };
        let mut mass = |present: bool| -> Result<Option<f64>, GattError> {
            Ok(if present {
                Some(f64::from(reader.u16()?) * units.weight_resolution())
            } else {
                None
            })
        };
        let muscle_mass = mass(flags & BODY_FLAG_MUSCLE_MASS != 0)?;
        let fat_free_mass = mass(flags & BODY_FLAG_FAT_FREE_MASS != 0)?;
        let soft_lean_mass = mass(flags & BODY_FLAG_SOFT_LEAN_MASS != 0)?;
        let body_water_mass = mass(flags & BODY_FLAG_BODY_WATER_MASS != 0)?;
        let impedance = if flags & BODY_FLAG_IMPEDANCE != 0 {
            Some(f64::from(reader.u16()?) * 0.1)
        } else {
            None
        };
        let weight = if flags & BODY_FLAG_WEIGHT != 0 {
            Some(f64::from(reader.u16()?) * units.weight_resolution())
        } else {
            None
        };
        let height = if flags & BODY_FLAG_HEIGHT != 0 {
            Some(f64::from(reader.u16()?) * units.height_resolution())
        } else {
            None
        };
        reader.finish()?;
        Ok(Self {
            body_fat_percent,
            units,
            timestamp,
            user_id,
            basal_metabolism,
            muscle_percent,
            muscle_mass,
            fat_free_mass,
            soft_lean_mass,
            body_water_mass,
            impedance,
            weight,
            height,
            multiple_packet: flags & BODY_FLAG_MULTIPLE_PACKET != 0,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.units == MeasurementUnits::Imperial {
            flags |= BODY_FLAG_IMPERIAL;
        }
        if self.timestamp.is_some() {
            flags |= BODY_FLAG_TIMESTAMP;
        }
        if self.user_id.is_some() {
            flags |= BODY_FLAG_USER_ID;
        }
        if self.basal_metabolism.is_some() {
            flags |= BODY_FLAG_BASAL_METABOLISM;
        }
        if self.muscle_percent.is_some() {
            flags |= BODY_FLAG_MUSCLE_PERCENTAGE;
        }
        if self.muscle_mass.is_some() {
            flags |= BODY_FLAG_MUSCLE_MASS;
        }
        if self.fat_free_mass.is_some() {
            flags |= BODY_FLAG_FAT_FREE_MASS;
        }
        if self.soft_lean_mass.is_some() {
            flags |= BODY_FLAG_SOFT_LEAN_MASS;
        }
        if self.body_water_mass.is_some() {
            flags |= BODY_FLAG_BODY_WATER_MASS;
        }
        if self.impedance.is_some() {
            flags |= BODY_FLAG_IMPEDANCE;
        }
        if self.weight.is_some() {
            flags |= BODY_FLAG_WEIGHT;
        }
        if self.height.is_some() {
            flags |= BODY_FLAG_HEIGHT;
        }
        if self.multiple_packet {
            flags |= BODY_FLAG_MULTIPLE_PACKET;
        }
        let mut data = Vec::new();
        data.extend_from_slice(&flags.to_le_bytes());
        match self.body_fat_percent {
            Some(fat) => data.extend_from_slice(&encode_scaled(fat, 0.1)?.to_le_bytes()),
            None => data.extend_from_slice(&UNSUCCESSFUL.to_le_bytes()),
        }
        if let Some(timestamp) = &self.timestamp {
            data.extend_from_slice(&timestamp.encode()?);
        }
        if let Some(user_id) = self.user_id {
            data.push(user_id);
        }
        if let Some(basal) = self.basal_metabolism {
            data.extend_from_slice(&basal.to_le_bytes());
        }
        if let Some(muscle) = self.muscle_percent {
            data.extend_from_slice(&encode_scaled(muscle, 0.1)?.to_le_bytes());
        }
        for mass in [
            self.muscle_mass,
            self.fat_free_mass,
            self.soft_lean_mass,
            self.body_water_mass,
        ]
        .into_iter()
        .flatten()
        {
            data.extend_from_slice(
                &encode_scaled(mass, self.units.weight_resolution())?.to_le_bytes(),
            );
        }
        if let Some(impedance) = self.impedance {
            data.extend_from_slice(&encode_scaled(impedance, 0.1)?.to_le_bytes());
        }
        if let Some(weight) = self.weight {
            data.extend_from_slice(
                &encode_scaled(weight, self.units.weight_resolution())?.to_le_bytes(),
            );
        }
        if let Some(height) = self.height {
            data.extend_from_slice(
                &encode_scaled(height, self.units.height_resolution())?.to_le_bytes(),
            );
        }
        Ok(data)
    }
}

pub(crate) struct WeightMeasurementCodec;

impl CharacteristicCodec for WeightMeasurementCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a9d)
    }

    fn name(&self) -> &str {
        "Weight Measurement"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(3, 15).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::Weight(WeightMeasurement::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Weight(measurement) => measurement.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct BodyCompositionMeasurementCodec;

impl CharacteristicCodec for BodyCompositionMeasurementCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a9c)
    }

    fn name(&self) -> &str {
        "Body Composition Measurement"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(4, 30).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::BodyComposition(BodyCompositionMeasurement::decode(
            data,
        )?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::BodyComposition(measurement) => measurement.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_weight_si() {
        // 14000 * 0.005 = 70 kg.
        let decoded = WeightMeasurement::decode(&[0x00, 0xb0, 0x36]).unwrap();
        assert_eq!(decoded.weight, Some(70.0));
        assert_eq!(decoded.units, MeasurementUnits::Si);
    }

    #[test]
    fn decode_weight_unsuccessful() {
        let decoded = WeightMeasurement::decode(&[0x00, 0xff, 0xff]).unwrap();
        assert_eq!(decoded.weight, None);
    }

    #[test]
    fn weight_round_trip() {
        let measurement = WeightMeasurement {
            weight: Some(82.5),
            units: MeasurementUnits::Si,
            timestamp: Some(DateTime {
                year: 2026,
                month: 8,
                day: 1,
                hour: 6,
                minute: 45,
                second: 0,
            }),
            user_id: Some(2),
            bmi_height: Some((24.5, 1.75)),
        };
        assert_eq!(
            WeightMeasurement::decode(&measurement.encode().unwrap()).unwrap(),
            measurement
        );
    }

    #[test]
    fn body_composition_round_trip() {
        let measurement = BodyCompositionMeasurement {
            body_fat_percent: Some(18.5),
            units: MeasurementUnits::Si,
            timestamp: None,
            user_id: Some(1),
            basal_metabolism: Some(7100),
            muscle_percent: Some(42.5),
            muscle_mass: Some(34.5),
            fat_free_mass: None,
            soft_lean_mass: None,
            body_water_mass: Some(45.0),
            impedance: Some(500.0),
            weight: Some(82.5),
            height: None,
            multiple_packet: false,
        };
        assert_eq!(
            BodyCompositionMeasurement::decode(&measurement.encode().unwrap()).unwrap(),
            measurement
        );
    }

    #[test]
    fn body_composition_unsuccessful() {
        let decoded = BodyCompositionMeasurement::decode(&[0x00, 0x00, 0xff, 0xff]).unwrap();
        assert_eq!(decoded.body_fat_percent, None);
    }
}
