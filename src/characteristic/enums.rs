//! Single-byte enumeration characteristics.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::enumeration::{EnumTemplate, UnknownPolicy};
use crate::template::int::UINT8;
use crate::types::{Value, ValueType};
use std::sync::Arc;

#[derive(Copy, Clone, Debug)]
pub(crate) struct EnumCodec {
    uuid: u16,
    name: &'static str,
    template: EnumTemplate,
}

const fn enum_codec(
    uuid: u16,
    name: &'static str,
    variants: &'static [(u32, &'static str)],
) -> EnumCodec {
    EnumCodec {
        uuid,
        name,
        template: EnumTemplate::new(UINT8, variants, UnknownPolicy::Keep),
    }
}

impl CharacteristicCodec for EnumCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(self.uuid)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn constraints(&self) -> Constraints {
        Constraints::exact(self.template.int().width()).typed(ValueType::Enumeration)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        Ok(Value::Enum(self.template.decode(data)?))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Enum(value) => self.template.encode(value),
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Enumeration,
                actual: other.value_type(),
            }),
        }
    }
}

const ENUMS: &[EnumCodec] = &[
    enum_codec(
        0x2a06,
        "Alert Level",
        &[(0, "No Alert"), (1, "Mild Alert"), (2, "High Alert")],
    ),
    enum_codec(
        0x2a38,
        "Body Sensor Location",
        &[
            (0, "Other"),
            (1, "Chest"),
            (2, "Wrist"),
            (3, "Finger"),
            (4, "Hand"),
            (5, "Ear Lobe"),
            (6, "Foot"),
        ],
    ),
    enum_codec(
        0x2aa3,
        "Barometric Pressure Trend",
        &[
            (0, "Unknown"),
            (1, "Continuously falling"),
            (2, "Continuously rising"),
            (3, "Falling, then steady"),
            (4, "Rising, then steady"),
            (5, "Falling before a lesser rise"),
            (6, "Falling before a greater rise"),
            (7, "Rising before a greater fall"),
            (8, "Rising before a lesser fall"),
            (9, "Steady"),
        ],
    ),
    enum_codec(
        0x2a8c,
        "Gender",
        &[(0, "Male"), (1, "Female"), (2, "Unspecified")],
    ),
    enum_codec(
        0x2a13,
        "Time Source",
        &[
            (0, "Unknown"),
            (1, "Network Time Protocol"),
            (2, "GPS"),
            (3, "Radio Time Signal"),
            (4, "Manual"),
            (5, "Atomic Clock"),
            (6, "Cellular Network"),
        ],
    ),
    enum_codec(
        0x2a93,
        "Sport Type for Aerobic and Anaerobic Thresholds",
        &[
            (0, "Unspecified"),
            (1, "Running (Treadmill)"),
            (2, "Cycling (Ergometer)"),
            (3, "Rowing (Ergometer)"),
            (4, "Cross Training (Elliptical)"),
            (5, "Climbing"),
            (6, "Skiing"),
            (7, "Skating"),
            (8, "Arm exercising"),
            (9, "Lower body exercising"),
            (10, "Upper body exercising"),
            (11, "Whole body exercising"),
        ],
    ),
    enum_codec(
        0x2a5d,
        "Sensor Location",
        &[
            (0, "Other"),
            (1, "Top of shoe"),
            (2, "In shoe"),
            (3, "Hip"),
            (4, "Front Wheel"),
            (5, "Left Crank"),
            (6, "Right Crank"),
            (7, "Left Pedal"),
            (8, "Right Pedal"),
            (9, "Front Hub"),
            (10, "Rear Dropout"),
            (11, "Chainstay"),
            (12, "Rear Wheel"),
            (13, "Rear Hub"),
            (14, "Chest"),
            (15, "Spider"),
            (16, "Chain Ring"),
        ],
    ),
    enum_codec(
        0x2a09,
        "Day of Week",
        &[
            (0, "Unknown"),
            (1, "Monday"),
            (2, "Tuesday"),
            (3, "Wednesday"),
            (4, "Thursday"),
            (5, "Friday"),
            (6, "Saturday"),
            (7, "Sunday"),
        ],
    ),
    enum_codec(
        0x2a0d,
        "DST Offset",
        &[
            (0, "Standard Time"),
            (2, "Half an Hour Daylight Time"),
            (4, "Daylight Time"),
            (8, "Double Daylight Time"),
            (255, "DST Offset not known"),
        ],
    ),
    enum_codec(0x2a41, "Ringer Setting", &[(0, "Silent"), (1, "Normal")]),
    enum_codec(
        0x2a43,
        "Alert Category ID",
        &[
            (0, "Simple Alert"),
            (1, "Email"),
            (2, "News"),
            (3, "Call"),
            (4, "Missed Call"),
            (5, "SMS/MMS"),
            (6, "Voice Mail"),
            (7, "Schedule"),
            (8, "High Prioritized Alert"),
            (9, "Instant Message"),
        ],
    ),
    enum_codec(
        0x2a1d,
        "Temperature Type",
        &[
            (1, "Armpit"),
            (2, "Body (general)"),
            (3, "Ear (usually ear lobe)"),
            (4, "Finger"),
            (5, "Gastro-intestinal Tract"),
            (6, "Mouth"),
            (7, "Rectum"),
            (8, "Toe"),
            (9, "Tympanum (ear drum)"),
        ],
    ),
    enum_codec(
        0x2aa6,
        "Central Address Resolution",
        &[(0, "Not Supported"), (1, "Supported")],
    ),
];

pub(crate) fn codecs() -> Vec<Arc<dyn CharacteristicCodec>> {
    ENUMS.iter().map(|codec| Arc::new(*codec) as _).collect()
}
