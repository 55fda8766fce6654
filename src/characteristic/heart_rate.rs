//! The Heart Rate Measurement characteristic.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::{round_half_even, Reader};
use crate::types::{Value, ValueType};
use log::warn;
use std::fmt::{self, Display, Formatter};

const FLAG_HEART_RATE_16BIT: u8 = 0x01;
const FLAG_SENSOR_CONTACT_SUPPORTED: u8 = 0x02;
const FLAG_SENSOR_CONTACT_DETECTED: u8 = 0x04;
const FLAG_ENERGY_EXPENDED: u8 = 0x08;
const FLAG_RR_INTERVALS: u8 = 0x10;
const FLAGS_RESERVED: u8 = 0xe0;

/// RR intervals are carried in units of 1/1024 s.
const RR_RESOLUTION: f64 = 1.0 / 1024.0;

/// A decoded Heart Rate Measurement value.
#[derive(Clone, Debug, PartialEq)]
pub struct HeartRateMeasurement {
    /// Heart rate in beats per minute.
    pub heart_rate: u16,
    /// Whether skin contact is detected; `None` when the sensor does not
    /// support contact detection.
    pub sensor_contact: Option<bool>,
    /// Accumulated energy expended in kilojoules, when reported.
    pub energy_expended: Option<u16>,
    /// RR-intervals in seconds, most recent last.
    pub rr_intervals: Vec<f64>,
}

impl Display for HeartRateMeasurement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} bpm", self.heart_rate)?;
        match self.sensor_contact {
            Some(true) => f.write_str(", contact")?,
            Some(false) => f.write_str(", no contact")?,
            None => {}
        }
        if let Some(energy) = self.energy_expended {
            write!(f, ", {energy} kJ")?;
        }
        if !self.rr_intervals.is_empty() {
            write!(f, ", {} RR-intervals", self.rr_intervals.len())?;
        }
        Ok(())
    }
}

impl HeartRateMeasurement {
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

        let heart_rate = if flags & FLAG_HEART_RATE_16BIT != 0 {
            reader.u16()?
        } else {
            reader.u8()?.into()
        };
        let sensor_contact = if flags & FLAG_SENSOR_CONTACT_SUPPORTED != 0 {
            Some(flags & FLAG_SENSOR_CONTACT_DETECTED != 0)
        } else {
            None
        };
        let energy_expended = if flags & FLAG_ENERGY_EXPENDED != 0 {
            Some(reader.u16()?)
        } else {
            None
        };

        let mut rr_intervals = Vec::new();
        if flags & FLAG_RR_INTERVALS != 0 {
            if reader.remaining() % 2 != 0 {
                // An odd trailing byte cannot be half an RR-interval.
                return Err(GattError::WrongLength {
                    length: data.len(),
                    expected_length: data.len() + 1,
                });
            }
            while reader.remaining() > 0 {
                rr_intervals.push(f64::from(reader.u16()?) * RR_RESOLUTION);
            }
        }
        reader.finish()?;

        Ok(Self {
            heart_rate,
            sensor_contact,
            energy_expended,
            rr_intervals,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut data = vec![0];
        let mut flags = 0;
        if self.heart_rate > 0xff {
            flags |= FLAG_HEART_RATE_16BIT;
            data.extend_from_slice(&self.heart_rate.to_le_bytes());
        } else {
            data.push(self.heart_rate as u8);
        }
        match self.sensor_contact {
            Some(detected) => {
                flags |= FLAG_SENSOR_CONTACT_SUPPORTED;
                if detected {
                    flags |= FLAG_SENSOR_CONTACT_DETECTED;
                }
            }
            None => {}
        }
        if let Some(energy) = self.energy_expended {
            flags |= FLAG_ENERGY_EXPENDED;
            data.extend_from_slice(&energy.to_le_bytes());
        }
        if !self.rr_intervals.is_empty() {
            flags |= FLAG_RR_INTERVALS;
            for &interval in &self.rr_intervals {
                let raw = round_half_even(interval / RR_RESOLUTION);
                if !(0.0..=65535.0).contains(&raw) {
                    return Err(GattError::OutOfRange {
                        value: interval,
                        min: 0.0,
                        max: 65535.0 * RR_RESOLUTION,
                    });
                }
                data.extend_from_slice(&(raw as u16).to_le_bytes());
            }
        }
        data[0] = flags;
        Ok(data)
    }
}

pub(crate) struct HeartRateMeasurementCodec;

impl CharacteristicCodec for HeartRateMeasurementCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a37)
    }

    fn name(&self) -> &str {
        "Heart Rate Measurement"
    }

    fn constraints(&self) -> Constraints {
        Constraints::at_least(2).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::HeartRate(HeartRateMeasurement::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::HeartRate(measurement) => measurement.encode(),
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
    fn decode_uint8_with_rr_intervals() {
        assert_eq!(
            HeartRateMeasurement::decode(&[
                0x10, 0x48, 0x01, 0x00, 0xd0, 0x07, 0xa0, 0x0f
            ])
            .unwrap(),
            HeartRateMeasurement {
                heart_rate: 72,
                sensor_contact: None,
                energy_expended: None,
                rr_intervals: vec![1.0 / 1024.0, 2000.0 / 1024.0, 4000.0 / 1024.0],
            }
        );
    }

    #[test]
    fn decode_uint16_with_contact_and_energy() {
        assert_eq!(
            HeartRateMeasurement::decode(&[0x0f, 0x2c, 0x01, 0x90, 0x01]).unwrap(),
            HeartRateMeasurement {
                heart_rate: 300,
                sensor_contact: Some(true),
                energy_expended: Some(400),
                rr_intervals: vec![],
            }
        );
    }

    #[test]
    fn decode_contact_supported_not_detected() {
        assert_eq!(
            HeartRateMeasurement::decode(&[0x02, 0x48]).unwrap(),
            HeartRateMeasurement {
                heart_rate: 72,
                sensor_contact: Some(false),
                energy_expended: None,
                rr_intervals: vec![],
            }
        );
    }

    #[test]
    fn decode_truncated() {
        assert!(matches!(
            HeartRateMeasurement::decode(&[0x01, 0x48]),
            Err(GattError::WrongLength { .. })
        ));
        assert!(matches!(
            HeartRateMeasurement::decode(&[0x08, 0x48, 0x90]),
            Err(GattError::WrongLength { .. })
        ));
    }

    #[test]
    fn decode_odd_rr_bytes() {
        assert!(matches!(
            HeartRateMeasurement::decode(&[0x10, 0x48, 0x01]),
            Err(GattError::WrongLength { .. })
        ));
    }

    #[test]
    fn decode_trailing_bytes_without_rr_flag() {
        assert!(matches!(
            HeartRateMeasurement::decode(&[0x00, 0x48, 0x01, 0x00]),
            Err(GattError::WrongLength { .. })
        ));
    }

    #[test]
    fn round_trip_preserves_present_fields() {
        let measurement = HeartRateMeasurement {
            heart_rate: 185,
            sensor_contact: Some(true),
            energy_expended: Some(512),
            rr_intervals: vec![0.5, 0.3125],
        };
        assert_eq!(
            HeartRateMeasurement::decode(&measurement.encode().unwrap()).unwrap(),
            measurement
        );

        let minimal = HeartRateMeasurement {
            heart_rate: 60,
            sensor_contact: None,
            energy_expended: None,
            rr_intervals: vec![],
        };
        let encoded = minimal.encode().unwrap();
        assert_eq!(encoded, vec![0x00, 60]);
        assert_eq!(HeartRateMeasurement::decode(&encoded).unwrap(), minimal);
    }

    #[test]
    fn encode_rr_out_of_range() {
        let measurement = HeartRateMeasurement {
            heart_rate: 60,
            sensor_contact: None,
            energy_expended: None,
            rr_intervals: vec![100.0],
        };
        assert!(matches!(
            measurement.encode(),
            Err(GattError::OutOfRange { .. })
        ));
    }

    #[test]
    fn format() {
        assert_eq!(
            HeartRateMeasurement {
                heart_rate: 72,
                sensor_contact: Some(true),
                energy_expended: None,
                rr_intervals: vec![0.5],
            }
            .to_string(),
            "72 bpm, contact, 1 RR-intervals"
        );
    }
}
