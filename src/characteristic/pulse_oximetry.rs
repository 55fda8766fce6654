//! Pulse oximeter characteristics: PLX Spot-Check Measurement, PLX Continuous
//! Measurement and PLX Features.

use crate::bleuuid::BluetoothUuid;
use crate::characteristic::features::FeatureSet;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::ieee11073::Sfloat;
use crate::template::time::DateTime;
use crate::template::Reader;
use crate::types::{Value, ValueType};
use log::warn;
use std::fmt::{self, Display, Formatter};

const SPOT_FLAG_TIMESTAMP: u8 = 0x01;
const SPOT_FLAG_MEASUREMENT_STATUS: u8 = 0x02;
const SPOT_FLAG_DEVICE_STATUS: u8 = 0x04;
const SPOT_FLAG_PULSE_AMPLITUDE: u8 = 0x08;
const SPOT_FLAG_CLOCK_NOT_SET: u8 = 0x10;
const SPOT_FLAGS_RESERVED: u8 = 0xe0;

const CONT_FLAG_FAST: u8 = 0x01;
const CONT_FLAG_SLOW: u8 = 0x02;
const CONT_FLAG_MEASUREMENT_STATUS: u8 = 0x04;
const CONT_FLAG_DEVICE_STATUS: u8 = 0x08;
const CONT_FLAG_PULSE_AMPLITUDE: u8 = 0x10;
const CONT_FLAGS_RESERVED: u8 = 0xe0;

const FEATURES_FLAG_MEASUREMENT_STATUS: u16 = 0x0001;
const FEATURES_FLAG_DEVICE_STATUS: u16 = 0x0002;

const PLX_FEATURE_BITS: &[(u8, &str)] = &[
    (0, "Measurement Status"),
    (1, "Device and Sensor Status"),
    (2, "Spot-Check Measurement Storage"),
    (3, "Spot-Check Timestamp"),
    (4, "SpO2PR-Fast"),
    (5, "SpO2PR-Slow"),
    (6, "Pulse Amplitude Index"),
    (7, "Multiple Bonds"),
];

/// A decoded PLX Spot-Check Measurement value.
///
/// SpO2 and pulse rate are `None` when the device reported NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct PlxSpotCheck {
    /// Oxygen saturation in percent.
    pub spo2: Option<f64>,
    /// Pulse rate in beats per minute.
    pub pulse_rate: Option<f64>,
    pub timestamp: Option<DateTime>,
    pub measurement_status: Option<u16>,
    pub device_status: Option<u32>,
    pub pulse_amplitude_index: Option<f64>,
    pub device_clock_not_set: bool,
}

impl Display for PlxSpotCheck {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        format_plx(f, self.spo2, self.pulse_rate)
    }
}

fn format_plx(f: &mut Formatter, spo2: Option<f64>, pulse_rate: Option<f64>) -> fmt::Result {
    match spo2 {
        Some(spo2) => write!(f, "SpO₂ {spo2}%")?,
        None => f.write_str("SpO₂ unknown")?,
    }
    if let Some(pulse_rate) = pulse_rate {
        write!(f, ", {pulse_rate} bpm")?;
    }
    Ok(())
}

impl PlxSpotCheck {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let flags = reader.u8()?;
        if flags & SPOT_FLAGS_RESERVED != 0 {
            warn!(
                "{}",
                GattError::ReservedFlags {
                    flags: (flags & SPOT_FLAGS_RESERVED).into()
                }
            );
        }
        let spo2 = reader.sfloat()?.value();
        let pulse_rate = reader.sfloat()?.value();
        let timestamp = if flags & SPOT_FLAG_TIMESTAMP != 0 {
            Some(DateTime::read(&mut reader)?)
        } else {
            None
        };
        let measurement_status = if flags & SPOT_FLAG_MEASUREMENT_STATUS != 0 {
            Some(reader.u16()?)
        } else {
            None
        };
        let device_status = if flags & SPOT_FLAG_DEVICE_STATUS != 0 {
            Some(reader.u24()?)
        } else {
            None
        };
        let pulse_amplitude_index = if flags & SPOT_FLAG_PULSE_AMPLITUDE != 0 {
            reader.sfloat()?.value()
        } else {
            None
        };
        reader.finish()?;
        Ok(Self {
            spo2,
            pulse_rate,
            timestamp,
            measurement_status,
            device_status,
            pulse_amplitude_index,
            device_clock_not_set: flags & SPOT_FLAG_CLOCK_NOT_SET != 0,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.timestamp.is_some() {
            flags |= SPOT_FLAG_TIMESTAMP;
        }
        if self.measurement_status.is_some() {
            flags |= SPOT_FLAG_MEASUREMENT_STATUS;
        }
        if self.device_status.is_some() {
            flags |= SPOT_FLAG_DEVICE_STATUS;
        }
        if self.pulse_amplitude_index.is_some() {
            flags |= SPOT_FLAG_PULSE_AMPLITUDE;
        }
        if self.device_clock_not_set {
            flags |= SPOT_FLAG_CLOCK_NOT_SET;
        }
        let mut data = vec![flags];
        data.extend_from_slice(&Sfloat::encode(self.spo2.unwrap_or(f64::NAN))?);
        data.extend_from_slice(&Sfloat::encode(self.pulse_rate.unwrap_or(f64::NAN))?);
        if let Some(timestamp) = &self.timestamp {
            data.extend_from_slice(&timestamp.encode()?);
        }
        if let Some(status) = self.measurement_status {
            data.extend_from_slice(&status.to_le_bytes());
        }
        if let Some(status) = self.device_status {
            data.extend_from_slice(&status.to_le_bytes()[..3]);
        }
        if let Some(amplitude) = self.pulse_amplitude_index {
            data.extend_from_slice(&Sfloat::encode(amplitude)?);
        }
        Ok(data)
    }
}

/// A decoded PLX Continuous Measurement value.
#[derive(Clone, Debug, PartialEq)]
pub struct PlxContinuous {
    pub spo2: Option<f64>,
    pub pulse_rate: Option<f64>,
    pub spo2_fast: Option<f64>,
    pub pulse_rate_fast: Option<f64>,
    pub spo2_slow: Option<f64>,
    pub pulse_rate_slow: Option<f64>,
    pub measurement_status: Option<u16>,
    pub device_status: Option<u32>,
    pub pulse_amplitude_index: Option<f64>,
}

impl Display for PlxContinuous {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        format_plx(f, self.spo2, self.pulse_rate)
    }
}

impl PlxContinuous {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let flags = reader.u8()?;
        if flags & CONT_FLAGS_RESERVED != 0 {
            warn!(
                "{}",
                GattError::ReservedFlags {
                    flags: (flags & CONT_FLAGS_RESERVED).into()
                }
            );
        }
        let spo2 = reader.sfloat()?.value();
        let pulse_rate = reader.sfloat()?.value();
        let (spo2_fast, pulse_rate_fast) = if flags & CONT_FLAG_FAST != 0 {
            (reader.sfloat()?.value(), reader.sfloat()?.value())
        } else {
            (None, None)
        };
        let (spo2_slow, pulse_rate_slow) = if flags & CONT_FLAG_SLOW != 0 {
            (reader.sfloat()?.value(), reader.sfloat()?.value())
        } else {
            (None, None)
        };
        let measurement_status = if flags & CONT_FLAG_MEASUREMENT_STATUS != 0 {
            Some(reader.u16()?)
        } else {
            None
        };
        let device_status = if flags & CONT_FLAG_DEVICE_STATUS != 0 {
            Some(reader.u24()?)
        } else {
            None
        };
        let pulse_amplitude_index = if flags & CONT_FLAG_PULSE_AMPLITUDE != 0 {
            reader.sfloat()?.value()
        } else {
            None
        };
        reader.finish()?;
        Ok(Self {
            spo2,
            pulse_rate,
            spo2_fast,
            pulse_rate_fast,
            spo2_slow,
            pulse_rate_slow,
            measurement_status,
            device_status,
            pulse_amplitude_index,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.spo2_fast.is_some() || self.pulse_rate_fast.is_some() {
            flags |= CONT_FLAG_FAST;
        }
        if self.spo2_slow.is_some() || self.pulse_rate_slow.is_some() {
            flags |= CONT_FLAG_SLOW;
        }
        if self.measurement_status.is_some() {
            flags |= CONT_FLAG_MEASUREMENT_STATUS;
        }
        if self.device_status.is_some() {
            flags |= CONT_FLAG_DEVICE_STATUS;
        }
        if self.pulse_amplitude_index.is_some() {
            flags |= CONT_FLAG_PULSE_AMPLITUDE;
        }
        let mut data = vec![flags];
        data.extend_from_slice(&Sfloat::encode(self.spo2.unwrap_or(f64::NAN))?);
        data.extend_from_slice(&Sfloat::encode(self.pulse_rate.unwrap_or(f64::NAN))?);
        if flags & CONT_FLAG_FAST != 0 {
            data.extend_from_slice(&Sfloat::encode(self.spo2_fast.unwrap_or(f64::NAN))?);
            data.extend_from_slice(&Sfloat::encode(self.pulse_rate_fast.unwrap_or(f64::NAN))?);
        }
        if flags & CONT_FLAG_SLOW != 0 {
            data.extend_from_slice(&Sfloat::encode(self.spo2_slow.unwrap_or(f64::NAN))?);
            data.extend_from_slice(&Sfloat::encode(self.pulse_rate_slow.unwrap_or(f64::NAN))?);
        }
        if let Some(status) = self.measurement_status {
            data.extend_from_slice(&status.to_le_bytes());
        }
        if let Some(status) = self.device_status {
            data.extend_from_slice(&status.to_le_bytes()[..3]);
        }
        if let Some(amplitude) = self.pulse_amplitude_index {
            data.extend_from_slice(&Sfloat::encode(amplitude)?);
        }
        Ok(data)
    }
}

/// A decoded PLX Features value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlxFeatures {
    pub features: FeatureSet,
    /// Which measurement-status bits the device supports.
    pub measurement_status_support: Option<u16>,
    /// Which device-and-sensor-status bits the device supports.
    pub device_status_support: Option<u32>,
}

impl Display for PlxFeatures {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.features.fmt(f)
    }
}

impl PlxFeatures {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let raw = reader.u16()?;
        let features = FeatureSet {
            raw: raw.into(),
            capabilities: PLX_FEATURE_BITS
                .iter()
                .filter(|(bit, _)| raw & (1 << bit) != 0)
                .map(|(_, name)| *name)
                .collect(),
        };
        let measurement_status_support = if raw & FEATURES_FLAG_MEASUREMENT_STATUS != 0 {
            Some(reader.u16()?)
        } else {
            None
        };
        let device_status_support = if raw & FEATURES_FLAG_DEVICE_STATUS != 0 {
            Some(reader.u24()?)
        } else {
            None
        };
        reader.finish()?;
        Ok(Self {
            features,
            measurement_status_support,
            device_status_support,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut data = Vec::new();
        data.extend_from_slice(&(self.features.raw as u16).to_le_bytes());
        if let Some(support) = self.measurement_status_support {
            data.extend_from_slice(&support.to_le_bytes());
        }
        if let Some(support) = self.device_status_support {
            data.extend_from_slice(&support.to_le_bytes()[..3]);
        }
        Ok(data)
    }
}

pub(crate) struct PlxSpotCheckCodec;

impl CharacteristicCodec for PlxSpotCheckCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a5e)
    }

    fn name(&self) -> &str {
        "PLX Spot-Check Measurement"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(5, 19).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::PlxSpotCheck(PlxSpotCheck::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::PlxSpotCheck(measurement) => measurement.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct PlxContinuousCodec;

impl CharacteristicCodec for PlxContinuousCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a5f)
    }

    fn name(&self) -> &str {
        "PLX Continuous Measurement"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(5, 20).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::PlxContinuous(PlxContinuous::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::PlxContinuous(measurement) => measurement.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct PlxFeaturesCodec;

impl CharacteristicCodec for PlxFeaturesCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a60)
    }

    fn name(&self) -> &str {
        "PLX Features"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(2, 7).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::PlxFeaturesValue(PlxFeatures::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::PlxFeaturesValue(features) => features.encode(),
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
    fn decode_spot_check() {
        // SpO2 98%, pulse 72 bpm, both exponent 0.
        let decoded = PlxSpotCheck::decode(&[0x00, 0x62, 0x00, 0x48, 0x00]).unwrap();
        assert_eq!(decoded.spo2, Some(98.0));
        assert_eq!(decoded.pulse_rate, Some(72.0));
        assert_eq!(decoded.timestamp, None);
    }

    #[test]
    fn decode_spot_check_unknown_pulse() {
        let decoded = PlxSpotCheck::decode(&[0x00, 0x62, 0x00, 0xff, 0x07]).unwrap();
        assert_eq!(decoded.spo2, Some(98.0));
        assert_eq!(decoded.pulse_rate, None);
    }

    #[test]
    fn spot_check_round_trip() {
        let measurement = PlxSpotCheck {
            spo2: Some(97.0),
            pulse_rate: Some(64.0),
            timestamp: Some(DateTime {
                year: 2026,
                month: 8,
                day: 1,
                hour: 12,
                minute: 0,
                second: 0,
            }),
            measurement_status: Some(0x0020),
            device_status: Some(0x000001),
            pulse_amplitude_index: Some(5.0),
            device_clock_not_set: false,
        };
        assert_eq!(
            PlxSpotCheck::decode(&measurement.encode().unwrap()).unwrap(),
            measurement
        );
    }

    #[test]
    fn continuous_round_trip() {
        let measurement = PlxContinuous {
            spo2: Some(96.0),
            pulse_rate: Some(80.0),
            spo2_fast: Some(95.0),
            pulse_rate_fast: Some(82.0),
            spo2_slow: None,
            pulse_rate_slow: None,
            measurement_status: None,
            device_status: None,
            pulse_amplitude_index: Some(6.5),
        };
        assert_eq!(
            PlxContinuous::decode(&measurement.encode().unwrap()).unwrap(),
            measurement
        );
    }

    #[test]
    fn features_with_status_masks() {
        let decoded = PlxFeatures::decode(&[0x03, 0x00, 0x20, 0x00, 0x01, 0x00, 0x00]).unwrap();
        assert_eq!(decoded.features.raw, 0x0003);
        assert_eq!(
            decoded.features.capabilities,
            vec!["Measurement Status", "Device and Sensor Status"]
        );
        assert_eq!(decoded.measurement_status_support, Some(0x0020));
        assert_eq!(decoded.device_status_support, Some(0x000001));
        assert_eq!(
            decoded.encode().unwrap(),
            vec![0x03, 0x00, 0x20, 0x00, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn features_trailing_bytes_rejected() {
        assert!(matches!(
            PlxFeatures::decode(&[0x00, 0x00, 0xaa]),
            Err(GattError::WrongLength { .. })
        ));
    }
}
