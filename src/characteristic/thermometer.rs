//! Health Thermometer characteristics: Temperature Measurement and
//! Intermediate Temperature.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::ieee11073::{Float32, MedicalFloat};
use crate::template::time::DateTime;
use crate::template::Reader;
use crate::types::{Value, ValueType};
use log::warn;
use num_enum::IntoPrimitive;
use std::fmt::{self, Display, Formatter};

const FLAG_FAHRENHEIT: u8 = 0x01;
const FLAG_TIMESTAMP: u8 = 0x02;
const FLAG_TEMPERATURE_TYPE: u8 = 0x04;
const FLAGS_RESERVED: u8 = 0xf8;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl Display for TemperatureUnit {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Celsius => f.write_str("°C"),
            Self::Fahrenheit => f.write_str("°F"),
        }
    }
}

/// Where on the body the temperature was taken.
#[derive(Copy, Clone, Debug, Eq, IntoPrimitive, PartialEq)]
#[repr(u8)]
pub enum TemperatureType {
    Armpit = 1,
    Body = 2,
    Ear = 3,
    Finger = 4,
    GastroIntestinalTract = 5,
    Mouth = 6,
    Rectum = 7,
    Toe = 8,
    Tympanum = 9,
}

impl TryFrom<u8> for TemperatureType {
    type Error = GattError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Armpit),
            2 => Ok(Self::Body),
            3 => Ok(Self::Ear),
            4 => Ok(Self::Finger),
            5 => Ok(Self::GastroIntestinalTract),
            6 => Ok(Self::Mouth),
            7 => Ok(Self::Rectum),
            8 => Ok(Self::Toe),
            9 => Ok(Self::Tympanum),
            _ => Err(GattError::UnknownEnumValue {
                value: value.into(),
            }),
        }
    }
}

/// A decoded Temperature Measurement value.
#[derive(Clone, Debug, PartialEq)]
pub struct TemperatureMeasurement {
    /// The measured temperature; `None` when the device reported NaN or "not
    /// at this resolution".
    pub temperature: Option<f64>,
    pub unit: TemperatureUnit,
    pub timestamp: Option<DateTime>,
    pub temperature_type: Option<TemperatureType>,
}

impl Display for TemperatureMeasurement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.temperature {
            Some(temperature) => write!(f, "{}{}", temperature, self.unit)?,
            None => f.write_str("unknown")?,
        }
        if let Some(timestamp) = &self.timestamp {
            write!(f, " at {timestamp}")?;
        }
        if let Some(temperature_type) = self.temperature_type {
            write!(f, " ({temperature_type:?})")?;
        }
        Ok(())
    }
}

impl TemperatureMeasurement {
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

        let unit = if flags & FLAG_FAHRENHEIT != 0 {
            TemperatureUnit::Fahrenheit
        } else {
            TemperatureUnit::Celsius
        };
        let temperature = match Float32::decode_raw(reader.u32()?) {
            MedicalFloat::Value(value) => Some(value),
            _ => None,
        };
        let timestamp = if flags & FLAG_TIMESTAMP != 0 {
            Some(DateTime::read(&mut reader)?)
        } else {
            None
        };
        let temperature_type = if flags & FLAG_TEMPERATURE_TYPE != 0 {
            Some(reader.u8()?.try_into()?)
        } else {
            None
        };
        reader.finish()?;

        Ok(Self {
            temperature,
            unit,
            timestamp,
            temperature_type,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.unit == TemperatureUnit::Fahrenheit {
            flags |= FLAG_FAHRENHEIT;
        }
        if self.timestamp.is_some() {
            flags |= FLAG_TIMESTAMP;
        }
        if self.temperature_type.is_some() {
            flags |= FLAG_TEMPERATURE_TYPE;
        }
        let mut data = vec![flags];
        data.extend_from_slice(&Float32::encode(self.temperature.unwrap_or(f64::NAN))?);
        if let Some(timestamp) = &self.timestamp {
            data.extend_from_slice(&timestamp.encode()?);
        }
        if let Some(temperature_type) = self.temperature_type {
            data.push(temperature_type.into());
        }
        Ok(data)
    }
}

pub(crate) struct TemperatureMeasurementCodec {
    uuid: u16,
    name: &'static str,
}

impl TemperatureMeasurementCodec {
    pub(crate) const MEASUREMENT: Self = Self {
        uuid: 0x2a1c,
        name: "Temperature Measurement",
    };
    pub(crate) const INTERMEDIATE: Self = Self {
        uuid: 0x2a1e,
        name: "Intermediate Temperature",
    };
}

impl CharacteristicCodec for TemperatureMeasurementCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(self.uuid)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(5, 13).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::TemperatureMeasurement(TemperatureMeasurement::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::TemperatureMeasurement(measurement) => measurement.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}
