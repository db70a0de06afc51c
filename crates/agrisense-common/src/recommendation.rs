//! Crop recommendation output records.

use serde::{Deserialize, Serialize};

use crate::soil::SoilReading;

pub const NOT_TRAINED_NAME: &str = "Model not trained";
pub const NOT_TRAINED_MESSAGE: &str = "Please train the model first";
pub const ERROR_NAME: &str = "Error";

/// One ranked crop with its confidence and a human-readable justification.
/// Produced fresh per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    /// Raw classifier probability in [0, 1]
    pub confidence: f64,
    #[serde(rename = "suitable_conditions")]
    pub justification: String,
}

impl Recommendation {
    /// Recommendation for `crop` under `reading`.
    pub fn for_crop(crop: &str, confidence: f64, reading: &SoilReading) -> Self {
        Self {
            name: crop.to_string(),
            confidence,
            justification: describe_conditions(crop, reading),
        }
    }

    /// Sentinel returned while no model has been fitted.
    pub fn not_trained() -> Self {
        Self {
            name: NOT_TRAINED_NAME.to_string(),
            confidence: 0.0,
            justification: NOT_TRAINED_MESSAGE.to_string(),
        }
    }

    /// Sentinel returned when scaling or inference fails.
    pub fn error(details: impl std::fmt::Display) -> Self {
        Self {
            name: ERROR_NAME.to_string(),
            confidence: 0.0,
            justification: format!("Error making prediction: {}", details),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.confidence == 0.0 && (self.name == NOT_TRAINED_NAME || self.name == ERROR_NAME)
    }
}

/// Shortest round-trip form; integral values keep a trailing `.0`.
/// Very large or small values use a signed, two-digit-minimum exponent
/// (`1e+308`, `1.5e-05`).
fn measurement(v: f64) -> String {
    let shortest = format!("{:?}", v);
    match shortest.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => shortest,
    }
}

/// Justification sentence embedding the four readings and the crop name.
pub fn describe_conditions(crop: &str, reading: &SoilReading) -> String {
    format!(
        "Current conditions (Temp: {}°C, Humidity: {}%, Moisture: {}%, pH: {}) are suitable for {}",
        measurement(reading.temperature),
        measurement(reading.humidity),
        measurement(reading.soil_moisture),
        measurement(reading.soil_ph),
        crop,
    )
}
