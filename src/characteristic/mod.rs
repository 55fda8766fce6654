//! Decoders and encoders for the standard characteristics.
//!
//! Most characteristics are one-line declarations over a template in
//! [`simple`]; the flag-driven measurement formats get their own modules.

pub mod appearance;
pub mod blood_pressure;
pub mod control_point;
pub mod cycling;
pub(crate) mod enums;
pub mod features;
pub(crate) mod generic;
pub mod glucose;
pub mod heart_rate;
pub mod location;
pub mod pulse_oximetry;
pub mod running_speed;
pub(crate) mod simple;
pub mod thermometer;
pub mod weight;

use crate::codec::CharacteristicCodec;
use std::sync::Arc;

/// All built-in codecs for standard characteristics.
pub(crate) fn standard_codecs() -> Vec<Arc<dyn CharacteristicCodec>> {
    let mut codecs = simple::codecs();
    codecs.extend(enums::codecs());
    codecs.extend(features::codecs());
    codecs.push(Arc::new(appearance::AppearanceCodec));
    codecs.push(Arc::new(heart_rate::HeartRateMeasurementCodec));
    codecs.push(Arc::new(
        thermometer::TemperatureMeasurementCodec::MEASUREMENT,
    ));
    codecs.push(Arc::new(
        thermometer::TemperatureMeasurementCodec::INTERMEDIATE,
    ));
    codecs.push(Arc::new(
        blood_pressure::BloodPressureMeasurementCodec::MEASUREMENT,
    ));
    codecs.push(Arc::new(
        blood_pressure::BloodPressureMeasurementCodec::INTERMEDIATE_CUFF_PRESSURE,
    ));
    codecs.push(Arc::new(glucose::GlucoseMeasurementCodec));
    codecs.push(Arc::new(glucose::GlucoseMeasurementContextCodec));
    codecs.push(Arc::new(cycling::CyclingPowerMeasurementCodec));
    codecs.push(Arc::new(cycling::CscMeasurementCodec));
    codecs.push(Arc::new(cycling::CyclingPowerControlPointCodec));
    codecs.push(Arc::new(running_speed::RscMeasurementCodec));
    codecs.push(Arc::new(weight::WeightMeasurementCodec));
    codecs.push(Arc::new(weight::BodyCompositionMeasurementCodec));
    codecs.push(Arc::new(pulse_oximetry::PlxSpotCheckCodec));
    codecs.push(Arc::new(pulse_oximetry::PlxContinuousCodec));
    codecs.push(Arc::new(pulse_oximetry::PlxFeaturesCodec));
    codecs.push(Arc::new(location::LocationAndSpeedCodec));
    codecs.push(Arc::new(location::NavigationCodec));
    codecs.push(Arc::new(location::LnControlPointCodec));
    codecs.push(Arc::new(control_point::BondManagementControlPointCodec));
    codecs.push(Arc::new(control_point::TimeUpdateControlPointCodec));
    codecs.push(Arc::new(control_point::AlertNotificationControlPointCodec));
    codecs.push(Arc::new(control_point::RingerControlPointCodec));
    codecs
}
