//! Blood Pressure Measurement and Intermediate Cuff Pressure characteristics.

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
use std::fmt::{self, Display, Formatter};

const FLAG_KPA: u8 = 0x01;
const FLAG_TIMESTAMP: u8 = 0x02;
const FLAG_PULSE_RATE: u8 = 0x04;
const FLAG_USER_ID: u8 = 0x08;
const FLAG_MEASUREMENT_STATUS: u8 = 0x10;
const FLAGS_RESERVED: u8 = 0xe0;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PressureUnit {
    MmHg,
    KPa,
}

impl Display for PressureUnit {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::MmHg => f.write_str("mmHg"),
            Self::KPa => f.write_str("kPa"),
        }
    }
}

bitflags! {
    /// Measurement status bits reported alongside a blood pressure reading.
    pub struct BloodPressureStatus: u16 {
        const BODY_MOVEMENT = 0x0001;
        const CUFF_TOO_LOOSE = 0x0002;
        const IRREGULAR_PULSE = 0x0004;
        const PULSE_RATE_EXCEEDS_UPPER_LIMIT = 0x0008;
        const PULSE_RATE_BELOW_LOWER_LIMIT = 0x0010;
        const IMPROPER_MEASUREMENT_POSITION = 0x0020;
    }
}

/// A decoded Blood Pressure Measurement value.
///
/// Component pressures are `None` when the device reported NaN, which
/// Intermediate Cuff Pressure uses for the diastolic and MAP slots.
#[derive(Clone, Debug, PartialEq)]
pub struct BloodPressureMeasurement {
    pub unit: PressureUnit,
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub mean_arterial_pressure: Option<f64>,
    pub timestamp: Option<DateTime>,
    /// Pulse rate in beats per minute, when reported and known.
    pub pulse_rate: Option<f64>,
    pub user_id: Option<u8>,
    pub measurement_status: Option<BloodPressureStatus>,
}

impl Display for BloodPressureMeasurement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match (self.systolic, self.diastolic) {
            (Some(systolic), Some(diastolic)) => {
                write!(f, "{}/{}{}", systolic, diastolic, self.unit)?;
            }
            (Some(systolic), None) => write!(f, "{}{}", systolic, self.unit)?,
            _ => f.write_str("unknown")?,
        }
        if let Some(pulse_rate) = self.pulse_rate {
            write!(f, ", {pulse_rate} bpm")?;
        }
        Ok(())
    }
}

impl BloodPressureMeasurement {
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

        let unit = if flags & FLAG_KPA != 0 {
            PressureUnit::KPa
        } else {
            PressureUnit::MmHg
        };
        let systolic = reader.sfloat()?.value();
        let diastolic = reader.sfloat()?.value();
        let mean_arterial_pressure = reader.sfloat()?.value();
        let timestamp = if flags & FLAG_TIMESTAMP != 0 {
            Some(DateTime::read(&mut reader)?)
        } else {
            None
        };
        let pulse_rate = if flags & FLAG_PULSE_RATE != 0 {
            reader.sfloat()?.value()
        } else {
            None
        };
        let user_id = if flags & FLAG_USER_ID != 0 {
            Some(reader.u8()?)
        } else {
            None
        };
        let measurement_status = if flags & FLAG_MEASUREMENT_STATUS != 0 {
            Some(BloodPressureStatus::from_bits_truncate(reader.u16()?))
        } else {
            None
        };
        reader.finish()?;

        Ok(Self {
            unit,
            systolic,
            diastolic,
            mean_arterial_pressure,
            timestamp,
            pulse_rate,
            user_id,
            measurement_status,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.unit == PressureUnit::KPa {
            flags |= FLAG_KPA;
        }
        if self.timestamp.is_some() {
            flags |= FLAG_TIMESTAMP;
        }
        if self.pulse_rate.is_some() {
            flags |= FLAG_PULSE_RATE;
        }
        if self.user_id.is_some() {
            flags |= FLAG_USER_ID;
        }
        if self.measurement_status.is_some() {
            flags |= FLAG_MEASUREMENT_STATUS;
        }
        let mut data = vec![flags];
        for component in [self.systolic, self.diastolic, self.mean_arterial_pressure] {
            data.extend_from_slice(&Sfloat::encode(component.unwrap_or(f64::NAN))?);
        }
        if let Some(timestamp) = &self.timestamp {
            data.extend_from_slice(&timestamp.encode()?);
        }
        if let Some(pulse_rate) = self.pulse_rate {
            data.extend_from_slice(&Sfloat::encode(pulse_rate)?);
        }
        if let Some(user_id) = self.user_id {
            data.push(user_id);
        }
        if let Some(status) = self.measurement_status {
            data.extend_from_slice(&status.bits().to_le_bytes());
        }
        Ok(data)
    }
}

pub(crate) struct BloodPressureMeasurementCodec {
    uuid: u16,
    name: &'static str,
}

impl BloodPressureMeasurementCodec {
    pub(crate) const MEASUREMENT: Self = Self {
        uuid: 0x2a35,
        name: "Blood Pressure Measurement",
    };
    pub(crate) const INTERMEDIATE_CUFF_PRESSURE: Self = Self {
        uuid: 0x2a36,
        name: "Intermediate Cuff Pressure",
    };
}

impl CharacteristicCodec for BloodPressureMeasurementCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(self.uuid)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(7, 19).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::BloodPressure(BloodPressureMeasurement::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::BloodPressure(measurement) => measurement.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}
