//! The RSC (Running Speed and Cadence) Measurement characteristic.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::{round_half_even, Reader};
use crate::types::{Value, ValueType};
use log::warn;
use std::fmt::{self, Display, Formatter};

const FLAG_STRIDE_LENGTH: u8 = 0x01;
const FLAG_TOTAL_DISTANCE: u8 = 0x02;
const FLAG_RUNNING: u8 = 0x04;
const FLAGS_RESERVED: u8 = 0xf8;

/// Speed is carried in units of 1/256 m/s.
const SPEED_RESOLUTION: f64 = 1.0 / 256.0;

/// A decoded RSC Measurement value.
#[derive(Clone, Debug, PartialEq)]
pub struct RscMeasurement {
    /// Instantaneous speed in m/s.
    pub speed: f64,
    /// Instantaneous cadence in steps per minute.
    pub cadence: u8,
    /// Instantaneous stride length in metres, when reported.
    pub stride_length: Option<f64>,
    /// Total distance in metres, when reported.
    pub total_distance: Option<f64>,
    /// True when running, false when walking.
    pub running: bool,
}

impl Display for RscMeasurement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{:.2} m/s, {} steps/min, {}",
            self.speed,
            self.cadence,
            if self.running { "running" } else { "walking" }
        )
    }
}

impl RscMeasurement {
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
        let speed = f64::from(reader.u16()?) * SPEED_RESOLUTION;
        let cadence = reader.u8()?;
        let stride_length = if flags & FLAG_STRIDE_LENGTH != 0 {
            Some(f64::from(reader.u16()?) * 0.01)
        } else {
            None
        };
        let total_distance = if flags & FLAG_TOTAL_DISTANCE != 0 {
            Some(f64::from(reader.u32()?) * 0.1)
        } else {
            None
        };
        reader.finish()?;
        Ok(Self {
            speed,
            cadence,
            stride_length,
            total_distance,
            running: flags & FLAG_RUNNING != 0,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.stride_length.is_some() {
            flags |= FLAG_STRIDE_LENGTH;
        }
        if self.total_distance.is_some() {
            flags |= FLAG_TOTAL_DISTANCE;
        }
        if self.running {
            flags |= FLAG_RUNNING;
        }
        let mut data = vec![flags];
        let raw_speed = round_half_even(self.speed / SPEED_RESOLUTION);
        if !(0.0..=65535.0).contains(&raw_speed) {
            return Err(GattError::OutOfRange {
                value: self.speed,
                min: 0.0,
                max: 65535.0 * SPEED_RESOLUTION,
            });
        }
        data.extend_from_slice(&(raw_speed as u16).to_le_bytes());
        data.push(self.cadence);
        if let Some(stride_length) = self.stride_length {
            let raw = round_half_even(stride_length / 0.01);
            if !(0.0..=65535.0).contains(&raw) {
                return Err(GattError::OutOfRange {
                    value: stride_length,
                    min: 0.0,
                    max: 655.35,
                });
            }
            data.extend_from_slice(&(raw as u16).to_le_bytes());
        }
        if let Some(total_distance) = self.total_distance {
            let raw = round_half_even(total_distance / 0.1);
            if !(0.0..=u32::MAX as f64).contains(&raw) {
                return Err(GattError::OutOfRange {
                    value: total_distance,
                    min: 0.0,
                    max: u32::MAX as f64 * 0.1,
                });
            }
            data.extend_from_slice(&(raw as u32).to_le_bytes());
        }
        Ok(data)
    }
}

pub(crate) struct RscMeasurementCodec;

impl CharacteristicCodec for RscMeasurementCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a53)
    }

    fn name(&self) -> &str {
        "RSC Measurement"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(4, 10).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::Rsc(RscMeasurement::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Rsc(measurement) => measurement.encode(),
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
    fn decode_walking() {
        // Speed 512/256 = 2 m/s, cadence 160.
        let decoded = RscMeasurement::decode(&[0x00, 0x00, 0x02, 0xa0]).unwrap();
        assert_eq!(
            decoded,
            RscMeasurement {
                speed: 2.0,
                cadence: 160,
                stride_length: None,
                total_distance: None,
                running: false,
            }
        );
    }

    #[test]
    fn decode_running_with_optional_fields() {
        let decoded = RscMeasurement::decode(&[
            0x07, 0x00, 0x03, 0xb4, 0x80, 0x00, 0xe8, 0x03, 0x00, 0x00,
        ])
        .unwrap();
        assert_eq!(decoded.speed, 3.0);
        assert_eq!(decoded.cadence, 180);
        assert_eq!(decoded.stride_length, Some(1.28));
        assert_eq!(decoded.total_distance, Some(100.0));
        assert!(decoded.running);
    }

    #[test]
    fn decode_truncated() {
        assert!(matches!(
            RscMeasurement::decode(&[0x00, 0x00]),
            Err(GattError::WrongLength { .. })
        ));
    }

    #[test]
    fn round_trip() {
        let measurement = RscMeasurement {
            speed: 3.5,
            cadence: 174,
            stride_length: Some(1.25),
            total_distance: Some(1234.5),
            running: true,
        };
        assert_eq!(
            RscMeasurement::decode(&measurement.encode().unwrap()).unwrap(),
            measurement
        );
    }
}
