//! Control-point characteristics with opcode-plus-parameter values: Bond
//! Management, Time Update, Alert Notification and Ringer.
//!
//! The cycling and location control points, which also carry response
//! indications, live with their measurement characteristics.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::text::UTF8;
use crate::template::Reader;
use crate::types::{Value, ValueType};
use num_enum::IntoPrimitive;
use std::fmt::{self, Display, Formatter};

/// The response-code opcode shared by the control points that indicate
/// responses.
pub(crate) const RESPONSE_OP_CODE: u8 = 0x20;

/// Result code carried in a control-point response indication.
#[derive(Copy, Clone, Debug, Eq, IntoPrimitive, PartialEq)]
#[repr(u8)]
pub enum ResponseCode {
    Success = 1,
    OpCodeNotSupported = 2,
    InvalidParameter = 3,
    OperationFailed = 4,
}

impl TryFrom<u8> for ResponseCode {
    type Error = GattError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // An unknown response code is a protocol violation, not a new variant.
        match value {
            1 => Ok(Self::Success),
            2 => Ok(Self::OpCodeNotSupported),
            3 => Ok(Self::InvalidParameter),
            4 => Ok(Self::OperationFailed),
            _ => Err(GattError::UnknownEnumValue {
                value: value.into(),
            }),
        }
    }
}

/// A Bond Management Control Point command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BondManagementCommand {
    pub operation: BondManagementOperation,
    /// Authorization code, when the feature requires one.
    pub authorization_code: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, IntoPrimitive, PartialEq)]
#[repr(u8)]
pub enum BondManagementOperation {
    DeleteRequestingBond = 1,
    DeleteRequestingBondClassic = 2,
    DeleteRequestingBondLowEnergy = 3,
    DeleteAllBonds = 4,
    DeleteAllBondsClassic = 5,
    DeleteAllBondsLowEnergy = 6,
    DeleteAllButRequestingBond = 7,
    DeleteAllButRequestingBondClassic = 8,
    DeleteAllButRequestingBondLowEnergy = 9,
}

impl TryFrom<u8> for BondManagementOperation {
    type Error = GattError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::DeleteRequestingBond),
            2 => Ok(Self::DeleteRequestingBondClassic),
            3 => Ok(Self::DeleteRequestingBondLowEnergy),
            4 => Ok(Self::DeleteAllBonds),
            5 => Ok(Self::DeleteAllBondsClassic),
            6 => Ok(Self::DeleteAllBondsLowEnergy),
            7 => Ok(Self::DeleteAllButRequestingBond),
            8 => Ok(Self::DeleteAllButRequestingBondClassic),
            9 => Ok(Self::DeleteAllButRequestingBondLowEnergy),
            _ => Err(GattError::UnknownEnumValue {
                value: value.into(),
            }),
        }
    }
}

impl Display for BondManagementCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}", self.operation)
    }
}

impl BondManagementCommand {
    fn decode(data: &[u8]) -> Result<Self, GattError> {
        let mut reader = Reader::new(data);
        let operation = reader.u8()?.try_into()?;
        let rest = reader.rest();
        let authorization_code = if rest.is_empty() {
            None
        } else {
            Some(UTF8.decode(rest)?)
        };
        Ok(Self {
            operation,
            authorization_code,
        })
    }

    fn encode(&self) -> Result<Vec<u8>, GattError> {
        let mut data = vec![self.operation.into()];
        if let Some(code) = &self.authorization_code {
            data.extend_from_slice(&UTF8.encode(code)?);
        }
        Ok(data)
    }
}

/// A Time Update Control Point command.
#[derive(Copy, Clone, Debug, Eq, IntoPrimitive, PartialEq)]
#[repr(u8)]
pub enum TimeUpdateCommand {
    GetReferenceUpdate = 1,
    CancelReferenceUpdate = 2,
}

impl TryFrom<u8> for TimeUpdateCommand {
    type Error = GattError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::GetReferenceUpdate),
            2 => Ok(Self::CancelReferenceUpdate),
            _ => Err(GattError::UnknownEnumValue {
                value: value.into(),
            }),
        }
    }
}

impl Display for TimeUpdateCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// An Alert Notification Control Point command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlertNotificationCommand {
    pub command: AlertNotificationOperation,
    /// Alert category the command applies to; 0xff means all categories.
    pub category: u8,
}

#[derive(Copy, Clone, Debug, Eq, IntoPrimitive, PartialEq)]
#[repr(u8)]
pub enum AlertNotificationOperation {
    EnableNewAlerts = 0,
    EnableUnreadAlerts = 1,
    DisableNewAlerts = 2,
    DisableUnreadAlerts = 3,
    NotifyNewAlertsImmediately = 4,
    NotifyUnreadAlertsImmediately = 5,
}

impl TryFrom<u8> for AlertNotificationOperation {
    type Error = GattError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::EnableNewAlerts),
            1 => Ok(Self::EnableUnreadAlerts),
            2 => Ok(Self::DisableNewAlerts),
            3 => Ok(Self::DisableUnreadAlerts),
            4 => Ok(Self::NotifyNewAlertsImmediately),
            5 => Ok(Self::NotifyUnreadAlertsImmediately),
            _ => Err(GattError::UnknownEnumValue {
                value: value.into(),
            }),
        }
    }
}

impl Display for AlertNotificationCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?} for category {}", self.command, self.category)
    }
}

/// A Ringer Control Point command.
#[derive(Copy, Clone, Debug, Eq, IntoPrimitive, PartialEq)]
#[repr(u8)]
pub enum RingerCommand {
    SilentMode = 1,
    MuteOnce = 2,
    CancelSilentMode = 3,
}

impl TryFrom<u8> for RingerCommand {
    type Error = GattError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::SilentMode),
            2 => Ok(Self::MuteOnce),
            3 => Ok(Self::CancelSilentMode),
            _ => Err(GattError::UnknownEnumValue {
                value: value.into(),
            }),
        }
    }
}

impl Display for RingerCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

pub(crate) struct BondManagementControlPointCodec;

impl CharacteristicCodec for BondManagementControlPointCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2aa4)
    }

    fn name(&self) -> &str {
        "Bond Management Control Point"
    }

    fn constraints(&self) -> Constraints {
        Constraints::bounded(1, 512).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::BondManagementControl(BondManagementCommand::decode(
            data,
        )?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::BondManagementControl(command) => command.encode(),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct TimeUpdateControlPointCodec;

impl CharacteristicCodec for TimeUpdateControlPointCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a16)
    }

    fn name(&self) -> &str {
        "Time Update Control Point"
    }

    fn constraints(&self) -> Constraints {
        Constraints::exact(1).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::TimeUpdateControl(data[0].try_into()?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::TimeUpdateControl(command) => Ok(vec![(*command).into()]),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct AlertNotificationControlPointCodec;

impl CharacteristicCodec for AlertNotificationControlPointCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a44)
    }

    fn name(&self) -> &str {
        "Alert Notification Control Point"
    }

    fn constraints(&self) -> Constraints {
        Constraints::exact(2).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::AlertNotificationControl(AlertNotificationCommand {
            command: data[0].try_into()?,
            category: data[1],
        }))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::AlertNotificationControl(command) => {
                Ok(vec![command.command.into(), command.category])
            }
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Structured,
                actual: other.value_type(),
            }),
        }
    }
}

pub(crate) struct RingerControlPointCodec;

impl CharacteristicCodec for RingerControlPointCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(0x2a40)
    }

    fn name(&self) -> &str {
        "Ringer Control Point"
    }

    fn constraints(&self) -> Constraints {
        Constraints::exact(1).typed(ValueType::Structured)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::RingerControl(data[0].try_into()?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::RingerControl(command) => Ok(vec![(*command).into()]),
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
    fn response_code_strict() {
        assert_eq!(ResponseCode::try_from(1), Ok(ResponseCode::Success));
        assert_eq!(
            ResponseCode::try_from(9),
            Err(GattError::UnknownEnumValue { value: 9 })
        );
    }

    #[test]
    fn bond_management_with_authorization_code() {
        let decoded = BondManagementCommand::decode(&[0x04, b'1', b'2', b'3', b'4']).unwrap();
        assert_eq!(
            decoded,
            BondManagementCommand {
                operation: BondManagementOperation::DeleteAllBonds,
                authorization_code: Some("1234".to_owned()),
            }
        );
        assert_eq!(decoded.encode().unwrap(), vec![0x04, b'1', b'2', b'3', b'4']);
    }

    #[test]
    fn bond_management_unknown_operation() {
        assert_eq!(
            BondManagementCommand::decode(&[0x0a]),
            Err(GattError::UnknownEnumValue { value: 0x0a })
        );
    }

    #[test]
    fn alert_notification_round_trip() {
        let codec = AlertNotificationControlPointCodec;
        let context = CharacteristicContext::new();
        let decoded = codec.decode(&[0x00, 0xff], &context).unwrap();
        assert_eq!(
            decoded,
            Value::AlertNotificationControl(AlertNotificationCommand {
                command: AlertNotificationOperation::EnableNewAlerts,
                category: 0xff,
            })
        );
        assert_eq!(codec.encode(&decoded).unwrap(), vec![0x00, 0xff]);
    }

    #[test]
    fn ringer_commands() {
        let codec = RingerControlPointCodec;
        let context = CharacteristicContext::new();
        assert_eq!(
            codec.decode(&[0x02], &context).unwrap(),
            Value::RingerControl(RingerCommand::MuteOnce)
        );
        assert_eq!(
            codec.decode(&[0x00], &context),
            Err(GattError::UnknownEnumValue { value: 0 })
        );
    }
}
