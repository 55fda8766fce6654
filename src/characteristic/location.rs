//! Location and Navigation characteristics: Location and Speed, Navigation
//! and the LN Control Point.

use crate::bleuuid::BluetoothUuid;
use crate::characteristic::control_point::{ResponseCode, RESPONSE_OP_CODE};
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::time::DateTime;
use crate::template::{round_half_even, Reader};
use crate::types::{Value, ValueType};
use log::warn;
use std::fmt::{self, Display, Formatter};

const LS_FLAG_SPEED: u16 = 0x0001;
const LS_FLAG_TOTAL_DISTANCE: u16 = 0x0002;
const LS_FLAG_LOCATION: u16 = 0x0004;
const LS_FLAG_ELEVATION: u16 = 0x0008;
const LS_FLAG_HEADING: u16 = 0x0010;
const LS_FLAG_ROLLING_TIME: u16 = 0x0020;
const LS_FLAG_UTC_TIME: u16 = 0x0040;
const LS_POSITION_STATUS_SHIFT: u16 = 7;
const LS_FLAG_HEADING_COMPASS: u16 = 0x1000;
const LS_FLAGS_RESERVED: u16 = 0xe000;

/// Latitude and longitude are carried in units of 1e-7 degrees.
const COORDINATE_RESOLUTION: f64 = 1e-7;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PositionStatus {
    NoPosition,
    Ok,
    Estimated,
    LastKnown,
}

impl PositionStatus {
    fn from_bits(bits: u16) -> Self {
        match bits & 0x03 {
            0 => Self::NoPosition,
            1 => Self::Ok,
            2 => Self::Estimated,
            _ => Self::LastKnown,
        }
    }

    fn bits(self) -> u16 {
        match self {
            Self::NoPosition => 0,
            Self::Ok => 1,
            Self::Estimated => 2,
            Self::LastKnown => 3,
        }
    }
}

/// A decoded Location and Speed value.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationAndSpeed {
    /// Instantaneous speed in m/s.
    pub speed: Option<f64>,
    /// Total distance in metres.
    pub total_distance: Option<f64>,
    /// Latitude and longitude in degrees, WGS84.
    pub location: Option<(f64, f64)>,
    /// Elevation in metres.
    pub elevation: Option<f64>,
    /// Heading in degrees.
    pub heading: Option<f64>,
    /// Rolling time in seconds.
    pub rolling_time: Option<u8>,
    pub utc_time: Option<DateTime>,
    pub position_status: PositionStatus,
    pub heading_from_compass: bool,
}

impl Display for LocationAndSpeed {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if let Some((latitude, longitude)) = self.location {
            write!(f, "{latitude}, {longitude}")?;
        } else {
            f.write_str("no position")?;
        }
        if let Some(speed) = self.speed {
            write!(f, " at {speed} m/s")?;
        }
        Ok(())
    }
}

impl LocationAndSpeed {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let flags = reader.u16()?;
        if flags & LS_FLAGS_RESERVED != 0 {
            warn!(
                "{}",
                GattError::ReservedFlags {
                    flags: (flags & LS_FLAGS_RESERVED).into()
                }
            );
        }
        let speed = if flags & LS_FLAG_SPEED != 0 {
            Some(f64::from(reader.u16()?) * 0.01)
        } else {
            None
        };
        let total_distance = if flags & LS_FLAG_TOTAL_DISTANCE != 0 {
            Some(f64::from(reader.u24()?) * 0.1)
        } else {
            None
        };
        let location = if flags & LS_FLAG_LOCATION != 0 {
            let latitude = f64::from(reader.i32()?) * COORDINATE_RESOLUTION;
            let longitude = f64::from(reader.i32()?) * COORDINATE_RESOLUTION;
            Some((latitude, longitude))
        } else {
            None
        };
        let elevation = if flags & LS_FLAG_ELEVATION != 0 {
            Some(f64::from(reader.i24()?) * 0.01)
        } else {
            None
        };
        let heading = if flags & LS_FLAG_HEADING != 0 {
            Some(f64::from(reader.u16()?) * 0.01)
        } else {
            None
        };
        let rolling_time = if flags & LS_FLAG_ROLLING_TIME != 0 {
            Some(reader.u8()?)
        } else {
            None
        };
        let utc_time = if flags & LS_FLAG_UTC_TIME != 0 {
            Some(DateTime::read(&mut reader)?)
        } else {
            None
        };
        reader.finish()?;
        Ok(Self {
            speed,
            total_distance,
            location,
            elevation,
            heading,
            rolling_time,
            utc_time,
            position_status: PositionStatus::from_bits(flags >> LS_POSITION_STATUS_SHIFT),
            heading_from_compass: flags & LS_FLAG_HEADING_COMPASS != 0,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = self.position_status.bits() << LS_POSITION_STATUS_SHIFT;
        if self.speed.is_some() {
            flags |= LS_FLAG_SPEED;
        }
        if self.total_distance.is_some() {
            flags |= LS_FLAG_TOTAL_DISTANCE;
        }
        if self.location.is_some() {
            flags |= LS_FLAG_LOCATION;
        }
        if self.elevation.is_some() {
            flags |= LS_FLAG_ELEVATION;
        }
        if self.heading.is_some() {
            flags |= LS_FLAG_HEADING;
        }
        if self.rolling_time.is_some() {
            flags |= LS_FLAG_ROLLING_TIME;
        }
        if self.utc_time.is_some() {
            flags |= LS_FLAG_UTC_TIME;
        }
        if self.heading_from_compass {
            flags |= LS_FLAG_HEADING_COMPASS;
        }
        let mut data = Vec::new();
        data.extend_from_slice(&flags.to_le_bytes());
        if let Some(speed) = self.speed {
            data.extend_from_slice(&encode_u16(speed, 0.01)?.to_le_bytes());
        }
        if let Some(distance) = self.total_distance {
            data.extend_from_slice(&encode_u24(distance, 0.1)?.to_le_bytes()[..3]);
        }
        if let Some((latitude, longitude)) = self.location {
            data.extend_from_slice(&encode_coordinate(latitude)?.to_le_bytes());
            data.extend_from_slice(&encode_coordinate(longitude)?.to_le_bytes());
        }
        if let Some(elevation) = self.elevation {
            data.extend_from_slice(&encode_i24(elevation, 0.01)?.to_le_bytes()[..3]);
        }
        if let Some(heading) = self.heading {
            data.extend_from_slice(&encode_u16(heading, 0.01)?.to_le_bytes());
        }
        if let Some(rolling_time) = self.rolling_time {
            data.push(rolling_time);
        }
        if let Some(utc_time) = &self.utc_time {
            data.extend_from_slice(&utc_time.encode()?);
        }
        Ok(data)
    }
}

fn encode_u16(value: f64, resolution: f64) -> Result<u16, GattError> {
    let raw = round_half_even(value / resolution);
    if !(0.0..=65535.0).contains(&raw) {
        return Err(GattError::OutOfRange {
            value,
            min: 0.0,
            max: 65535.0 * resolution,
        });
    }
    Ok(raw as u16)
}

fn encode_u24(value: f64, resolution: f64) -> Result<u32, GattError> {
    let raw = round_half_even(value / resolution);
    if !(0.0..=16_777_215.0).contains(&raw) {
        return Err(GattError::OutOfRange {
            value,
            min: 0.0,
            max: 16_777_215.0 * resolution,
        });
    }
    Ok(raw as u32)
}

fn encode_i24(value: f64, resolution: f64) -> Result<u32, GattError> {
    let raw = round_half_even(value / resolution);
    if !(-8_388_608.0..=8_388_607.0).contains(&raw) {
        return Err(GattError::OutOfRange {
            value,
            min: -8_388_608.0 * resolution,
            max: 8_388_607.0 * resolution,
        });
    }
    Ok((raw as i32 as u32) & 0x00ff_ffff)
}

fn encode_coordinate(value: f64) -> Result<i32, GattError> {
    let raw = round_half_even(value / COORDINATE_RESOLUTION);
    if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&raw) {
        return Err(GattError::OutOfRange {
            value,
            min: f64::from(i32::MIN) * COORDINATE_RESOLUTION,
            max: f64::from(i32::MAX) * COORDINATE_RESOLUTION,
        });
    }
    Ok(raw as i32)
}

const NAV_FLAG_REMAINING_DISTANCE: u16 = 0x0001;
const NAV_FLAG_REMAINING_VERTICAL: u16 = 0x0002;
const NAV_FLAG_ETA: u16 = 0x0004;
const NAV_POSITION_STATUS_SHIFT: u16 = 3;
const NAV_FLAG_HEADING_COMPASS: u16 = 0x0020;
const NAV_FLAG_TO_DESTINATION: u16 = 0x0040;
const NAV_FLAG_WAYPOINT_REACHED: u16 = 0x0080;
const NAV_FLAG_DESTINATION_REACHED: u16 = 0x0100;
const NAV_FLAGS_RESERVED: u16 = 0xfe00;

/// A decoded Navigation value.
#[derive(Clone, Debug, PartialEq)]
pub struct Navigation {
    /// Bearing to the next waypoint in degrees.
    pub bearing: f64,
    /// Current heading in degrees.
    pub heading: f64,
    /// Remaining distance in metres.
    pub remaining_distance: Option<f64>,
    /// Remaining vertical distance in metres.
    pub remaining_vertical_distance: Option<f64>,
    pub estimated_time_of_arrival: Option<DateTime>,
    pub position_status: PositionStatus,
    pub heading_from_compass: bool,
    pub navigating_to_destination: bool,
    pub waypoint_reached: bool,
    pub destination_reached: bool,
}

impl Display for Navigation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "bearing {}°, heading {}°", self.bearing, self.heading)?;
        if let Some(remaining) = self.remaining_distance {
            write!(f, ", {remaining} m remaining")?;
        }
        Ok(())
    }
}

impl Navigation {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let flags = reader.u16()?;
        if flags & NAV_FLAGS_RESERVED != 0 {
            warn!(
                "{}",
                GattError::ReservedFlags {
                    flags: (flags & NAV_FLAGS_RESERVED).into()
                }
            );
        }
        let bearing = f64::from(reader.u16()?) * 0.01;
        let heading = f64::from(reader.u16()?) * 0.01;
        let remaining_distance = if flags & NAV_FLAG_REMAINING_DISTANCE != 0 {
            Some(f64::from(reader.u24()?) * 0.1)
        } else {
            None
        };
        let remaining_vertical_distance = if flags & NAV_FLAG_REMAINING_VERTICAL != 0 {
            Some(f64::from(reader.i24()?) * 0.01)
        } else {
            None
        };
        let estimated_time_of_arrival = if flags & NAV_FLAG_ETA != 0 {
            Some(DateTime::read(&mut reader)?)
        } else {
            None
        };
        reader.finish()?;
        Ok(Self {
            bearing,
            heading,
            remaining_distance,
            remaining_vertical_distance,
            estimated_time_of_arrival,
            position_status: PositionStatus::from_bits(flags >> NAV_POSITION_STATUS_SHIFT),
            heading_from_compass: flags & NAV_FLAG_HEADING_COMPASS != 0,
            navigating_to_destination: flags & NAV_FLAG_TO_DESTINATION != 0,
            waypoint_reached: flags & NAV_FLAG_WAYPOINT_REACHED != 0,
            destination_reached: flags & NAV_FLAG_DESTINATION_REACHED != 0,
        })
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut flags = self.position_status.bits() << NAV_POSITION_STATUS_SHIFT;
        if self.remaining_distance.is_some() {
            flags |= NAV_FLAG_REMAINING_DISTANCE;
        }
        if self.remaining_vertical_distance.is_some() {
            flags |= NAV_FLAG_REMAINING_VERTICAL;
        }
        if self.estimated_time_of_arrival.is_some() {
            flags |= NAV_FLAG_ETA;
        }
        if self.heading_from_compass {
            flags |= NAV_FLAG_HEADING_COMPASS;
        }
        if self.navigating_to_destination {
            flags |= NAV_FLAG_TO_DESTINATION;
        }
        if self.waypoint_reached {
            flags |= NAV_FLAG_WAYPOINT_REACHED;
        }
        if self.destination_reached {
            flags |= NAV_FLAG_DESTINATION_REACHED;
        }
        let mut data = Vec::new();
        data.extend_from_slice(&flags.to_le_bytes());
        data.extend_from_slice(&encode_u16(self.bearing, 0.01)?.to_le_bytes());
        data.extend_from_slice(&encode_u16(self.heading, 0.01)?.to_le_bytes());
        if let Some(remaining) = self.remaining_distance {
            data.extend_from_slice(&encode_u24(remaining, 0.1)?.to_le_bytes()[..3]);
        }
        if let Some(vertical) = self.remaining_vertical_distance {
            data.extend_from_slice(&encode_i24(vertical, 0.01)?.to_le_bytes()[..3]);
        }
        if let Some(eta) = &self.estimated_time_of_arrival {
            data.extend_from_slice(&eta.encode()?);
        }
        Ok(data)
    }
}

/// An LN Control Point command or response.
#[derive(Clone, Debug, PartialEq)]
pub enum LnCommand {
    /// Cumulative total distance in metres.
    SetCumulativeValue(f64),
    MaskLocationAndSpeedContent(u16),
    NavigationControl(NavigationControl),
    RequestNumberOfRoutes,
    RequestNameOfRoute(u16),
    SelectRoute(u16),
    /// Fix rate in seconds.
    SetFixRate(u8),
    /// Elevation in metres.
    SetElevation(f64),
    Response {
        request_op_code: u8,
        response: ResponseCode,
        parameter: Vec<u8>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NavigationControl {
    Stop,
    Start,
    Pause,
    Resume,
    SkipWaypoint,
    StartNearest,
}

impl TryFrom<u8> for NavigationControl {
    type Error = GattError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Stop),
            1 => Ok(Self::Start),
            2 => Ok(Self::Pause),
            3 => Ok(Self::Resume),
            4 => Ok(Self::SkipWaypoint),
            5 => Ok(Self::StartNearest),
            _ => Err(GattError::UnknownEnumValue {
                value: value.into(),
            }),
        }
    }
}

impl From<NavigationControl> for u8 {
    fn from(control: NavigationControl) -> Self {
        match control {
            NavigationControl::Stop => 0,
            NavigationControl::Start => 1,
            NavigationControl::Pause => 2,
            NavigationControl::Resume => 3,
            NavigationControl::SkipWaypoint => 4,
            NavigationControl::StartNearest => 5,
        }
    }
}

impl Display for LnCommand {
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

impl LnCommand {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let op_code = reader.u8()?;
        let command = match op_code {
            0x01 => Self::SetCumulativeValue(f64::from(reader.u24()?) * 0.1),
            0x02 => Self::MaskLocationAndSpeedContent(reader.u16()?),
            0x03 => Self::NavigationControl(reader.u8()?.try_into()?),
            0x04 => Self::RequestNumberOfRoutes,
            0x05 => Self::RequestNameOfRoute(reader.u16()?),
            0x06 => Self::SelectRoute(reader.u16()?),
            0x07 => Self::SetFixRate(reader.u8()?),
            0x08 => Self::SetElevation(f64::from(reader.i24()?) * 0.01),
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
            Self::SetCumulativeValue(distance) => {
                let mut data = vec![0x01];
                data.extend_from_slice(&encode_u24(*distance, 0.1)?.to_le_bytes()[..3]);
                data
            }
            Self::MaskLocationAndSpeedContent(mask) => {
                let mut data = vec![0x02];
                data.extend_from_slice(&mask.to_le_bytes());
                data
            }
            Self::NavigationControl(control) => vec![0x03, (*control).into()],
            Self::RequestNumberOfRoutes => vec![0x04],
            Self::RequestNameOfRoute(index) => {
                let mut data = vec![0x05];
                data.extend_from_slice(&index.to_le_bytes());
                data
            }
            Self::SelectRoute(index) => {
                let mut data = vec![0x06];
                data.extend_from_slice(&index.to_le_bytes());
                data
            }
            Self::SetFixRate(rate) => vec![0x07, *rate],
            Self::SetElevation(elevation) => {
                let mut data = vec![0x08];
                data.extend_from_slice(&encode_i24(*elevation, 0.01)?.to_le_bytes()[..3]);
                data
            }
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

pub(crate) struct LocationAndSpeedCodec;

impl CharacteristicCodec for LocationAndSpeedCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a67)
    }

    fn name(&self) -> &str {
        "Location and Speed"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(2, 28).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::LocationAndSpeed(LocationAndSpeed::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::LocationAndSpeed(location) => location.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct NavigationCodec;

impl CharacteristicCodec for NavigationCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a68)
    }

    fn name(&self) -> &str {
        "Navigation"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(6, 19).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::Navigation(Navigation::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Navigation(navigation) => navigation.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct LnControlPointCodec;

impl CharacteristicCodec for LnControlPointCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a6b)
    }

    fn name(&self) -> &str {
        "LN Control Point"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(1, 20).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::LnControl(LnCommand::decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::LnControl(command) => command.encode(),
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
    fn decode_location_and_speed() {
        let decoded = LocationAndSpeed::decode(&[
            0x85, 0x00, // speed + location present, position ok
            0xf4, 0x01, // 5 m/s
            0x80, 0x87, 0x4b, 0x1f, // latitude 52.5
            0x80, 0x4f, 0xe5, 0x07, // longitude 13.25
        ])
        .unwrap();
        assert_eq!(decoded.speed, Some(5.0));
        assert_eq!(decoded.location, Some((52.5, 13.25)));
        assert_eq!(decoded.position_status, PositionStatus::Ok);
    }

    #[test]
    fn location_and_speed_round_trip() {
        let value = LocationAndSpeed {
            speed: Some(2.5),
            total_distance: Some(1000.5),
            location: Some((52.5, 13.25)),
            elevation: Some(-12.5),
            heading: Some(270.0),
            rolling_time: Some(5),
            utc_time: None,
            position_status: PositionStatus::Estimated,
            heading_from_compass: true,
        };
        assert_eq!(
            LocationAndSpeed::decode(&value.encode().unwrap()).unwrap(),
            value
        );
    }

    #[test]
    fn navigation_round_trip() {
        let value = Navigation {
            bearing: 45.0,
            heading: 44.5,
            remaining_distance: Some(150.0),
            remaining_vertical_distance: Some(-2.0),
            estimated_time_of_arrival: None,
            position_status: PositionStatus::Ok,
            heading_from_compass: false,
            navigating_to_destination: true,
            waypoint_reached: false,
            destination_reached: false,
        };
        assert_eq!(Navigation::decode(&value.encode().unwrap()).unwrap(), value);
    }

    #[test]
    fn ln_commands() {
        assert_eq!(
            LnCommand::decode(&[0x03, 0x01]).unwrap(),
            LnCommand::NavigationControl(NavigationControl::Start)
        );
        assert_eq!(
            LnCommand::decode(&[0x06, 0x02, 0x00]).unwrap(),
            LnCommand::SelectRoute(2)
        );
        assert_eq!(
            LnCommand::decode(&[0x09]),
            Err(GattError::UnknownEnumValue { value: 9 })
        );
    }

    #[test]
    fn ln_response_round_trip() {
        let response = LnCommand::Response {
            request_op_code: 0x04,
            response: ResponseCode::Success,
            parameter: vec![0x03, 0x00],
        };
        assert_eq!(
            LnCommand::decode(&response.encode().unwrap()).unwrap(),
            response
        );
    }
}
