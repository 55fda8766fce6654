//! Feature characteristics: bitmaps in which each bit advertises a capability
//! of the peer device.

use crate::bleuuid::BluetoothUuid;
use crate::codec::{CharacteristicCodec, Constraints};
use crate::context::CharacteristicContext;
use crate::error::GattError;
use crate::template::int::IntTemplate;
use crate::types::{Value, ValueType};
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// A decoded feature bitmap: the raw bits plus the names of the set
/// capabilities.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeatureSet {
    pub raw: u64,
    pub capabilities: Vec<&'static str>,
}

impl Display for FeatureSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.capabilities.is_empty() {
            f.write_str("none")
        } else {
            write!(f, "{}", self.capabilities.iter().join(", "))
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct FeatureCodec {
    uuid: u16,
    name: &'static str,
    width: usize,
    bits: &'static [(u8, &'static str)],
}

const fn feature(
    uuid: u16,
    name: &'static str,
    width: usize,
    bits: &'static [(u8, &'static str)],
) -> FeatureCodec {
    FeatureCodec {
        uuid,
        name,
        width,
        bits,
    }
}

impl FeatureCodec {
    fn capabilities(&self, raw: u64) -> Vec<&'static str> {
        self.bits
            .iter()
            .filter(|(bit, _)| raw & (1 << bit) != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}

impl CharacteristicCodec for FeatureCodec {
    fn uuid(&self) -> BluetoothUuid {
        BluetoothUuid::from_u16(self.uuid)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn constraints(&self) -> Constraints {
        Constraints::exact(self.width).typed(ValueType::Bitmap)
    }

    fn decode(&self, data: &[u8], _: &CharacteristicContext) -> Result<Value, GattError> {
        let raw = IntTemplate::new(self.width, false).decode(data)? as u64;
        Ok(Value::Features(FeatureSet {
            raw,
            capabilities: self.capabilities(raw),
        }))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, GattError> {
        match value {
            Value::Features(features) => {
                IntTemplate::new(self.width, false).encode(features.raw as i64)
            }
            other => Err(GattError::TypeMismatch {
                expected: ValueType::Bitmap,
                actual: other.value_type(),
            }),
        }
    }
}

const FEATURES: &[FeatureCodec] = &[
    feature(
        0x2a51,
        "Glucose Feature",
        2,
        &[
            (0, "Low Battery Detection"),
            (1, "Sensor Malfunction Detection"),
            (2, "Sensor Sample Size"),
            (3, "Sensor Strip Insertion Error Detection"),
            (4, "Sensor Strip Type Error Detection"),
            (5, "Sensor Result High-Low Detection"),
            (6, "Sensor Temperature High-Low Detection"),
            (7, "Sensor Read Interrupt Detection"),
            (8, "General Device Fault"),
            (9, "Time Fault"),
            (10, "Multiple Bond"),
        ],
    ),
    feature(
        0x2a49,
        "Blood Pressure Feature",
        2,
        &[
            (0, "Body Movement Detection"),
            (1, "Cuff Fit Detection"),
            (2, "Irregular Pulse Detection"),
            (3, "Pulse Rate Range Detection"),
            (4, "Measurement Position Detection"),
            (5, "Multiple Bond"),
        ],
    ),
    feature(
        0x2a65,
        "Cycling Power Feature",
        4,
        &[
            (0, "Pedal Power Balance"),
            (1, "Accumulated Torque"),
            (2, "Wheel Revolution Data"),
            (3, "Crank Revolution Data"),
            (4, "Extreme Magnitudes"),
            (5, "Extreme Angles"),
            (6, "Top and Bottom Dead Spot Angles"),
            (7, "Accumulated Energy"),
            (8, "Offset Compensation Indicator"),
            (9, "Offset Compensation"),
            (10, "Measurement Content Masking"),
            (11, "Multiple Sensor Locations"),
            (12, "Crank Length Adjustment"),
            (13, "Chain Length Adjustment"),
            (14, "Chain Weight Adjustment"),
            (15, "Span Length Adjustment"),
            (16, "Torque Based Sensor Measurement Context"),
            (17, "Instantaneous Measurement Direction"),
            (18, "Factory Calibration Date"),
            (19, "Enhanced Offset Compensation"),
        ],
    ),
    feature(
        0x2a54,
        "RSC Feature",
        2,
        &[
            (0, "Instantaneous Stride Length Measurement"),
            (1, "Total Distance Measurement"),
            (2, "Walking or Running Status"),
            (3, "Calibration Procedure"),
            (4, "Multiple Sensor Locations"),
        ],
    ),
    feature(
        0x2a5c,
        "CSC Feature",
        2,
        &[
            (0, "Wheel Revolution Data"),
            (1, "Crank Revolution Data"),
            (2, "Multiple Sensor Locations"),
        ],
    ),
    feature(
        0x2a6a,
        "LN Feature",
        4,
        &[
            (0, "Instantaneous Speed"),
            (1, "Total Distance"),
            (2, "Location"),
            (3, "Elevation"),
            (4, "Heading"),
            (5, "Rolling Time"),
            (6, "UTC Time"),
            (7, "Remaining Distance"),
            (8, "Remaining Vertical Distance"),
            (9, "Estimated Time of Arrival"),
            (10, "Number of Beacons in Solution"),
            (11, "Number of Beacons in View"),
            (12, "Time to First Fix"),
            (13, "Estimated Horizontal Position Error"),
            (14, "Estimated Vertical Position Error"),
            (15, "Horizontal Dilution of Precision"),
            (16, "Vertical Dilution of Precision"),
            (17, "Location and Speed Content Masking"),
            (18, "Fix Rate Setting"),
            (19, "Elevation Setting"),
            (20, "Position Status"),
        ],
    ),
    feature(
        0x2a9b,
        "Body Composition Feature",
        4,
        &[
            (0, "Time Stamp"),
            (1, "Multiple Users"),
            (2, "Basal Metabolism"),
            (3, "Muscle Percentage"),
            (4, "Muscle Mass"),
            (5, "Fat Free Mass"),
            (6, "Soft Lean Mass"),
            (7, "Body Water Mass"),
            (8, "Impedance"),
            (9, "Weight"),
            (10, "Height"),
        ],
    ),
    feature(
        0x2a9e,
        "Weight Scale Feature",
        4,
        &[(0, "Time Stamp"), (1, "Multiple Users"), (2, "BMI")],
    ),
];

pub(crate) fn codecs() -> Vec<Arc<dyn CharacteristicCodec>> {
    FEATURES.iter().map(|codec| Arc::new(*codec) as _).collect()
}
