//! Cycling characteristics: Cycling Power Measurement, CSC Measurement and
//! the Cycling Power Control Point.

use crate::bleuuid::BluetoothUuid;
use crate::characteristic::control_point::{ResponseCode, RESPONSE_OP_CODE};
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::{round_half_even, Reader};
use crate::types::{Value, ValueType};
use log::warn;
use std::fmt::{self, Display, Formatter};

const POWER_FLAG_PEDAL_BALANCE: u16 = 0x0001;
const POWER_FLAG_PEDAL_BALANCE_LEFT: u16 = 0x0002;
const POWER_FLAG_ACCUMULATED_TORQUE: u16 = 0x0004;
const POWER_FLAG_TORQUE_SOURCE_CRANK: u16 = 0x0008;
const POWER_FLAG_WHEEL_DATA: u16 = 0x0010;
const POWER_FLAG_CRANK_DATA: u16 = 0x0020;
const POWER_FLAG_EXTREME_FORCE: u16 = 0x0040;
const POWER_FLAG_EXTREME_TORQUE: u16 = 0x0080;
const POWER_FLAG_EXTREME_ANGLES: u16 = 0x0100;
const POWER_FLAG_TOP_DEAD_SPOT: u16 = 0x0200;
const POWER_FLAG_BOTTOM_DEAD_SPOT: u16 = 0x0400;
const POWER_FLAG_ACCUMULATED_ENERGY: u16 = 0x0800;
const POWER_FLAG_OFFSET_COMPENSATION: u16 = 0x1000;
const POWER_FLAGS_RESERVED: u16 = 0xe000;

/// Wheel event times tick at 1/2048 s, crank event times at 1/1024 s.
const WHEEL_TIME_RESOLUTION: f64 = 1.0 / 2048.0;
const CRANK_TIME_RESOLUTION: f64 = 1.0 / 1024.0;
const TORQUE_RESOLUTION: f64 = 1.0 / 32.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TorqueSource {
    Wheel,
    Crank,
}

/// Cumulative wheel revolutions with the time of the last wheel event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WheelRevolutionData {
    pub revolutions: u32,
    /// Seconds, wrapping every 32 s (power) or 64 s (CSC).
    pub last_event_time: f64,
}

/// Cumulative crank revolutions with the time of the last crank event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CrankRevolutionData {
    pub revolutions: u16,
    /// Seconds, wrapping every 64 s.
    pub last_event_time: f64,
}

/// A decoded Cycling Power Measurement value.
#[derive(Clone, Debug, PartialEq)]
pub struct CyclingPowerMeasurement {
    /// Instantaneous power in watts.
    pub instantaneous_power: i16,
    /// Pedal power balance in percent, with the flag saying whether it is
    /// referenced to the left pedal.
    pub pedal_power_balance: Option<f64>,
    pub pedal_power_balance_left: bool,
    /// Accumulated torque in newton-metres, and what it was measured at.
    pub accumulated_torque: Option<f64>,
    pub torque_source: TorqueSource,
    pub wheel: Option<WheelRevolutionData>,
    pub crank: Option<CrankRevolutionData>,
    /// Maximum and minimum force magnitudes in newtons.
    pub extreme_force: Option<(i16, i16)>,
    /// Maximum and minimum torque magnitudes in newton-metres.
    pub extreme_torque: Option<(f64, f64)>,
    /// Maximum and minimum angles in degrees.
    pub extreme_angles: Option<(u16, u16)>,
    pub top_dead_spot_angle: Option<u16>,
    pub bottom_dead_spot_angle: Option<u16>,
    /// Accumulated energy in kilojoules.
    pub accumulated_energy: Option<u16>,
    pub offset_compensation_indicator: bool,
}

impl Display for CyclingPowerMeasurement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} W", self.instantaneous_power)?;
        if let Some(balance) = self.pedal_power_balance {
            write!(f, ", balance {balance}%")?;
        }
        if let Some(wheel) = &self.wheel {
            write!(f, ", {} wheel revs", wheel.revolutions)?;
        }
        if let Some(crank) = &self.crank {
            write!(f, ", {} crank revs", crank.revolutions)?;
        }
        Ok(())
    }
}

impl CyclingPowerMeasurement {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let flags = reader.u16()?;
        if flags & POWER_FLAGS_RESERVED != 0 {
            warn!(
                "{}",
                GattError::ReservedFlags {
                    flags: (flags & POWER_FLAGS_RESERVED).into()
                }
            );
        }

        let instantaneous_power = reader.i16()?;
        let pedal_power_balance = if flags & POWER_FLAG_PEDAL_BALANCE != 0 {
            Some(f64::from(reader.u8()?) * 0.5)
        } else {
            None
        };
        let accumulated_torque = if flags & POWER_FLAG_ACCUMULATED_TORQUE != 0 {
            Some(f64::from(reader.u16()?) * TORQUE_RESOLUTION)
        } else {
            None
        };
        let wheel = if flags & POWER_FLAG_WHEEL_DATA != 0 {
            Some(WheelRevolutionData {
                revolutions: reader.u32()?,
                last_event_time: f64::from(reader.u16()?) * WHEEL_TIME_RESOLUTION,
            })
        } else {
            None
        };
        let crank = if flags & POWER_FLAG_CRANK_DATA != 0 {
            Some(CrankRevolutionData {
                revolutions: reader.u16()?,
                last_event_time: f64::from(reader.u16()?) * CRANK_TIME_RESOLUTION,
            })
        } else {
            None
        };
        let extreme_force = if flags & POWER_FLAG_EXTREME_FORCE != 0 {
            Some((reader.i16()?, reader.i16()?))
        } else {
            None
        };
        let extreme_torque = if flags & POWER_FLAG_EXTREME_TORQUE != 0 {
            Some((
                f64::from(reader.i16()?) * TORQUE_RESOLUTION,
                f64::from(reader.i16()?) * TORQUE_RESOLUTION,
            ))
        } else {
            None
        };
        let extreme_angles = if flags & POWER_FLAG_EXTREME_ANGLES != 0 {
            // Two 12-bit angles packed into three bytes.
            let packed = reader.u24()?;
            Some(((packed & 0x0fff) as u16, (packed >> 12) as u16))
        } else {
            None
        };
        let top_dead_spot_angle = if flags & POWER_FLAG_TOP_DEAD_SPOT != 0 {
            Some(reader.u16()?)
        } else {
            None
        };
        let bottom_dead_spot_angle = if flags & POWER_FLAG_BOTTOM_DEAD_SPOT != 0 {
            Some(reader.u16()?)
        } else {
            None
        };
        let accumulated_energy = if flags & POWER_FLAG_ACCUMULATED_ENERGY != 0 {
            Some(reader.u16()?)
        } else {
            None
        };
        reader.finish()?;

        Ok(Self {
            instantaneous_power,
            pedal_power_balance,
            pedal_power_balance_left: flags & POWER_FLAG_PEDAL_BALANCE_LEFT != 0,
            accumulated_torque,
            torque_source: if flags & POWER_FLAG_TORQUE_SOURCE_CRANK != 0 {
                TorqueSource::Crank
            } else {
                TorqueSource::Wheel
            },
            wheel,
            crank,
            extreme_force,
            extreme_torque,
            extreme_angles,
            top_dead_spot_angle,
            bottom_dead_spot_angle,
            accumulated_energy,
            offset_compensation_indicator: flags & POWER_FLAG_OFFSET_COMPENSATION != 0,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.pedal_power_balance.is_some() {
            flags |= POWER_FLAG_PEDAL_BALANCE;
        }
        if self.pedal_power_balance_left {
            flags |= POWER_FLAG_PEDAL_BALANCE_LEFT;
        }
        if self.accumulated_torque.is_some() {
            flags |= POWER_FLAG_ACCUMULATED_TORQUE;
        }
        if self.torque_source == TorqueSource::Crank {
            flags |= POWER_FLAG_TORQUE_SOURCE_CRANK;
        }
        if self.wheel.is_some() {
            flags |= POWER_FLAG_WHEEL_DATA;
        }
        if self.crank.is_some() {
            flags |= POWER_FLAG_CRANK_DATA;
        }
        if self.extreme_force.is_some() {
            flags |= POWER_FLAG_EXTREME_FORCE;
        }
        if self.extreme_torque.is_some() {
            flags |= POWER_FLAG_EXTREME_TORQUE;
        }
        if self.extreme_angles.is_some() {
            flags |= POWER_FLAG_EXTREME_ANGLES;
        }
        if self.top_dead_spot_angle.is_some() {
            flags |= POWER_FLAG_TOP_DEAD_SPOT;
        }
        if self.bottom_dead_spot_angle.is_some() {
            flags |= POWER_FLAG_BOTTOM_DEAD_SPOT;
        }
        if self.accumulated_energy.is_some() {
            flags |= POWER_FLAG_ACCUMULATED_ENERGY;
        }
        if self.offset_compensation_indicator {
            flags |= POWER_FLAG_OFFSET_COMPENSATION;
        }

        let mut data = Vec::new();
        data.extend_from_slice(&flags.to_le_bytes());
        data.extend_from_slice(&self.instantaneous_power.to_le_bytes());
        if let Some(balance) = self.pedal_power_balance {
            data.push(encode_scaled_u8(balance, 2.0)?);
        }
        if let Some(torque) = self.accumulated_torque {
            data.extend_from_slice(&encode_scaled_u16(torque, 32.0)?.to_le_bytes());
        }
        if let Some(wheel) = &self.wheel {
            data.extend_from_slice(&wheel.revolutions.to_le_bytes());
            data.extend_from_slice(
                &encode_scaled_u16(wheel.last_event_time, 2048.0)?.to_le_bytes(),
            );
        }
        if let Some(crank) = &self.crank {
            data.extend_from_slice(&crank.revolutions.to_le_bytes());
            data.extend_from_slice(
                &encode_scaled_u16(crank.last_event_time, 1024.0)?.to_le_bytes(),
            );
        }
        if let Some((max, min)) = self.extreme_force {
            data.extend_from_slice(&max.to_le_bytes());
            data.extend_from_slice(&min.to_le_bytes());
        }
        if let Some((max, min)) = self.extreme_torque {
            data.extend_from_slice(&encode_scaled_i16(max, 32.0)?.to_le_bytes());
            data.extend_from_slice(&encode_scaled_i16(min, 32.0)?.to_le_bytes());
        }
        if let Some((max, min)) = self.extreme_angles {
            let packed = (max as u32 & 0x0fff) | ((min as u32) << 12);
            data.extend_from_slice(&packed.to_le_bytes()[..3]);
        }
        if let Some(angle) = self.top_dead_spot_angle {
            data.extend_from_slice(&angle.to_le_bytes());
        }
        if let Some(angle) = self.bottom_dead_spot_angle {
            data.extend_from_slice(&angle.to_le_bytes());
        }
        if let Some(energy) = self.accumulated_energy {
            data.extend_from_slice(&energy.to_le_bytes());
        }
        Ok(data)
    }
}

fn encode_scaled_u8(value: f64, per_unit: f64) -> Result<u8, GattError> {
    let raw = round_half_even(value * per_unit);
    if !(0.0..=255.0).contains(&raw) {
        return Err(GattError::OutOfRange {
            value,
            min: 0.0,
            max: 255.0 / per_unit,
        });
    }
    Ok(raw as u8)
}

fn encode_scaled_u16(value: f64, per_unit: f64) -> Result<u16, GattError> {
    let raw = round_half_even(value * per_unit);
    if !(0.0..=65535.0).contains(&raw) {
        return Err(GattError::OutOfRange {
            value,
            min: 0.0,
            max: 65535.0 / per_unit,
        });
    }
    Ok(raw as u16)
}

fn encode_scaled_i16(value: f64, per_unit: f64) -> Result<i16, GattError> {
    let raw = round_half_even(value * per_unit);
    if !(-32768.0..=32767.0).contains(&raw) {
        return Err(GattError::OutOfRange {
            value,
            min: -32768.0 / per_unit,
            max: 32767.0 / per_unit,
        });
    }
    Ok(raw as i16)
}

const CSC_FLAG_WHEEL_DATA: u8 = 0x01;
const CSC_FLAG_CRANK_DATA: u8 = 0x02;
const CSC_FLAGS_RESERVED: u8 = 0xfc;

/// A decoded CSC Measurement value.
#[derive(Clone, Debug, PartialEq)]
pub struct CscMeasurement {
    pub wheel: Option<WheelRevolutionData>,
    pub crank: Option<CrankRevolutionData>,
}

impl Display for CscMeasurement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match (&self.wheel, &self.crank) {
            (Some(wheel), Some(crank)) => write!(
                f,
                "{} wheel revs, {} crank revs",
                wheel.revolutions, crank.revolutions
            ),
            (Some(wheel), None) => write!(f, "{} wheel revs", wheel.revolutions),
            (None, Some(crank)) => write!(f, "{} crank revs", crank.revolutions),
            (None, None) => f.write_str("empty"),
        }
    }
}

impl CscMeasurement {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let flags = reader.u8()?;
        if flags & CSC_FLAGS_RESERVED != 0 {
            warn!(
                "{}",
                GattError::ReservedFlags {
                    flags: (flags & CSC_FLAGS_RESERVED).into()
                }
            );
        }
        let wheel = if flags & CSC_FLAG_WHEEL_DATA != 0 {
            Some(WheelRevolutionData {
                revolutions: reader.u32()?,
                last_event_time: f64::from(reader.u16()?) * CRANK_TIME_RESOLUTION,
            })
        } else {
            None
        };
        let crank = if flags & CSC_FLAG_CRANK_DATA != 0 {
            Some(CrankRevolutionData {
                revolutions: reader.u16()?,
                last_event_time: f64::from(reader.u16()?) * CRANK_TIME_RESOLUTION,
            })
        } else {
            None
        };
        reader.finish()?;
        Ok(Self { wheel, crank })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = 0;
        if self.wheel.is_some() {
            flags |= CSC_FLAG_WHEEL_DATA;
        }
        if self.crank.is_some() {
            flags |= CSC_FLAG_CRANK_DATA;
        }
        let mut data = vec![flags];
        if let Some(wheel) = &self.wheel {
            data.extend_from_slice(&wheel.revolutions.to_le_bytes());
            data.extend_from_slice(
                &encode_scaled_u16(wheel.last_event_time, 1024.0)?.to_le_bytes(),
            );
        }
        if let Some(crank) = &self.crank {
            data.extend_from_slice(&crank.revolutions.to_le_bytes());
            data.extend_from_slice(
                &encode_scaled_u16(crank.last_event_time, 1024.0)?.to_le_bytes(),
            );
        }
        Ok(data)
    }
}

/// A Cycling Power Control Point command or response.
#[derive(Clone, Debug, PartialEq)]
pub enum CyclingPowerCommand {
    SetCumulativeValue(u32),
    UpdateSensorLocation(u8),
    RequestSupportedSensorLocations,
    /// Crank length in millimetres.
    SetCrankLength(f64),
    RequestCrankLength,
    /// Chain length in millimetres.
    SetChainLength(u16),
    RequestChainLength,
    /// Chain weight in grams.
    SetChainWeight(u16),
    RequestChainWeight,
    /// Span length in millimetres.
    SetSpanLength(u16),
    RequestSpanLength,
    StartOffsetCompensation,
    MaskMeasurementContent(u16),
    RequestSamplingRate,
    RequestFactoryCalibrationDate,
    /// A response indication to a previous request.
    Response {
        request_op_code: u8,
        response: ResponseCode,
        parameter: Vec<u8>,
    },
}

impl Display for CyclingPowerCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Response {
                request_op_code,
                response,
                ..
            } => write!(f, "response to {request_op_code:#04x}: {response:?}"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl CyclingPowerCommand {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let op_code = reader.u8()?;
        let command = match op_code {
            0x01 => Self::SetCumulativeValue(reader.u32()?),
            0x02 => Self::UpdateSensorLocation(reader.u8()?),
            0x03 => Self::RequestSupportedSensorLocations,
            0x04 => Self::SetCrankLength(f64::from(reader.u16()?) * 0.5),
            0x05 => Self::RequestCrankLength,
            0x06 => Self::SetChainLength(reader.u16()?),
            0x07 => Self::RequestChainLength,
            0x08 => Self::SetChainWeight(reader.u16()?),
            0x09 => Self::RequestChainWeight,
            0x0a => Self::SetSpanLength(reader.u16()?),
            0x0b => Self::RequestSpanLength,
            0x0c => Self::StartOffsetCompensation,
            0x0d => Self::MaskMeasurementContent(reader.u16()?),
            0x0e => Self::RequestSamplingRate,
            0x0f => Self::RequestFactoryCalibrationDate,
            RESPONSE_OP_CODE => Self::Response {
                request_op_code: reader.u8()?,
                response: reader.u8()?.try_into()?,
                parameter: reader.rest().to_vec(),
            },
            other => {
                return Err(GattError::UnknownEnumValue {
                    value: other.into(),
                })
            }
        };
        reader.finish()?;
        Ok(command)
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        Ok(match self {
            Self::SetCumulativeValue(value) => {
                let mut data = vec![0x01];
                data.extend_from_slice(&value.to_le_bytes());
                data
            }
            Self::UpdateSensorLocation(location) => vec![0x02, *location],
            Self::RequestSupportedSensorLocations => vec![0x03],
            Self::SetCrankLength(length) => {
                let mut data = vec![0x04];
                data.extend_from_slice(&encode_scaled_u16(*length, 2.0)?.to_le_bytes());
                data
            }
            Self::RequestCrankLength => vec![0x05],
            Self::SetChainLength(length) => {
                let mut data = vec![0x06];
                data.extend_from_slice(&length.to_le_bytes());
                data
            }
            Self::RequestChainLength => vec![0x07],
            Self::SetChainWeight(weight) => {
                let mut data = vec![0x08];
                data.extend_from_slice(&weight.to_le_bytes());
                data
            }
            Self::RequestChainWeight => vec![0x09],
            Self::SetSpanLength(length) => {
                let mut data = vec![0x0a];
                data.extend_from_slice(&length.to_le_bytes());
                data
            }
            Self::RequestSpanLength => vec![0x0b],
            Self::StartOffsetCompensation => vec![0x0c],
            Self::MaskMeasurementContent(mask) => {
                let mut data = vec![0x0d];
                data.extend_from_slice(&mask.to_le_bytes());
                data
            }
            Self::RequestSamplingRate => vec![0x0e],
            Self::RequestFactoryCalibrationDate => vec![0x0f],
            Self::Response {
                request_op_code,
                response,
                parameter,
            } => {
                let mut data = vec![RESPONSE_OP_CODE, *request_op_code, (*response).into()];
                data.extend_from_slice(parameter);
                data
            }
        })
    }
}

pub(crate) struct CyclingPowerMeasurementCodec;

impl CharacteristicCodec for CyclingPowerMeasurementCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a63)
    }

    fn name(&self) -> &str {
        "Cycling Power Measurement"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(4, 35).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::CyclingPower(CyclingPowerMeasurement::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::CyclingPower(measurement) => measurement.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct CscMeasurementCodec;

impl CharacteristicCodec for CscMeasurementCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a5b)
    }

    fn name(&self) -> &str {
        "CSC Measurement"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(1, 11).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::Csc(CscMeasurement::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Csc(measurement) => measurement.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct CyclingPowerControlPointCodec;

impl CharacteristicCodec for CyclingPowerControlPointCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a66)
    }

    fn name(&self) -> &str {
        "Cycling Power Control Point"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(1, 20).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::CyclingPowerControl(CyclingPowerCommand::decode(
            data,
        )?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::CyclingPowerControl(command) => command.encode(),
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
    fn decode_power_only() {
        // Flags 0x0000, instantaneous power 100 W.
        let decoded = CyclingPowerMeasurement::decode(&[0x00, 0x00, 0x64, 0x00]).unwrap();
        assert_eq!(decoded.instantaneous_power, 100);
        assert_eq!(decoded.pedal_power_balance, None);
        assert_eq!(decoded.wheel, None);
        assert_eq!(decoded.crank, None);
        assert_eq!(decoded.accumulated_energy, None);
    }

    #[test]
    fn decode_with_wheel_and_crank() {
        let decoded = CyclingPowerMeasurement::decode(&[
            0x30, 0x00, // wheel + crank data
            0x2c, 0x01, // 300 W
            0x10, 0x27, 0x00, 0x00, // 10000 wheel revolutions
            0x00, 0x08, // wheel event at 1 s
            0xe8, 0x03, // 1000 crank revolutions
            0x00, 0x04, // crank event at 1 s
        ])
        .unwrap();
        assert_eq!(
            decoded.wheel,
            Some(WheelRevolutionData {
                revolutions: 10000,
                last_event_time: 1.0,
            })
        );
        assert_eq!(
            decoded.crank,
            Some(CrankRevolutionData {
                revolutions: 1000,
                last_event_time: 1.0,
            })
        );
    }

    #[test]
    fn power_round_trip() {
        let measurement = CyclingPowerMeasurement {
            instantaneous_power: -15,
            pedal_power_balance: Some(51.5),
            pedal_power_balance_left: true,
            accumulated_torque: Some(12.5),
            torque_source: TorqueSource::Crank,
            wheel: Some(WheelRevolutionData {
                revolutions: 42,
                last_event_time: 0.5,
            }),
            crank: Some(CrankRevolutionData {
                revolutions: 17,
                last_event_time: 0.25,
            }),
            extreme_force: Some((250, -30)),
            extreme_torque: None,
            extreme_angles: Some((350, 10)),
            top_dead_spot_angle: Some(15),
            bottom_dead_spot_angle: Some(195),
            accumulated_energy: Some(3),
            offset_compensation_indicator: false,
        };
        assert_eq!(
            CyclingPowerMeasurement::decode(&measurement.encode().unwrap()).unwrap(),
            measurement
        );
    }

    #[test]
    fn csc_round_trip() {
        let measurement = CscMeasurement {
            wheel: Some(WheelRevolutionData {
                revolutions: 100_000,
                last_event_time: 2.5,
            }),
            crank: None,
        };
        assert_eq!(
            CscMeasurement::decode(&measurement.encode().unwrap()).unwrap(),
            measurement
        );
    }

    #[test]
    fn csc_decode_truncated() {
        assert!(matches!(
            CscMeasurement::decode(&[0x01, 0x00, 0x00]),
            Err(GattError::WrongLength { .. })
        ));
    }

    #[test]
    fn control_point_commands() {
        assert_eq!(
            CyclingPowerCommand::decode(&[0x01, 0x10, 0x27, 0x00, 0x00]).unwrap(),
            CyclingPowerCommand::SetCumulativeValue(10000)
        );
        assert_eq!(
            CyclingPowerCommand::decode(&[0x04, 0x5e, 0x01]).unwrap(),
            CyclingPowerCommand::SetCrankLength(175.0)
        );
        assert_eq!(
            CyclingPowerCommand::decode(&[0xf0]),
            Err(GattError::UnknownEnumValue { value: 0xf0 })
        );
    }

    #[test]
    fn control_point_response() {
        let decoded = CyclingPowerCommand::decode(&[0x20, 0x05, 0x01, 0x5e, 0x01]).unwrap();
        assert_eq!(
            decoded,
            CyclingPowerCommand::Response {
                request_op_code: 0x05,
                response: ResponseCode::Success,
                parameter: vec![0x5e, 0x01],
            }
        );
        assert_eq!(
            decoded.encode().unwrap(),
            vec![0x20, 0x05, 0x01, 0x5e, 0x01]
        );
    }

    #[test]
    fn control_point_round_trip() {
        for command in [
            CyclingPowerCommand::SetCumulativeValue(1),
            CyclingPowerCommand::RequestSupportedSensorLocations,
            CyclingPowerCommand::SetCrankLength(172.5),
            CyclingPowerCommand::MaskMeasurementContent(0x01ff),
            CyclingPowerCommand::RequestFactoryCalibrationDate,
        ] {
            assert_eq!(
                CyclingPowerCommand::decode(&command.encode().unwrap()).unwrap(),
                command
            );
        }
    }
}
