//! Soil-condition snapshots and labelled training rows.

use serde::{Deserialize, Serialize};

use crate::error::{AgriError, Result};

/// Feature names in the order the classifier consumes them.
pub const FEATURE_NAMES: [&str; 4] = ["temperature", "humidity", "soil_moisture", "soil_ph"];

/// Four-scalar soil snapshot used as classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    /// Air temperature (°C)
    pub temperature: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Volumetric soil moisture (%)
    pub soil_moisture: f64,
    /// Soil pH, typically 0–14
    pub soil_ph: f64,
}

impl SoilReading {
    pub fn new(temperature: f64, humidity: f64, soil_moisture: f64, soil_ph: f64) -> Self {
        Self { temperature, humidity, soil_moisture, soil_ph }
    }

    /// Feature vector in `FEATURE_NAMES` order.
    pub fn as_features(&self) -> [f64; 4] {
        [self.temperature, self.humidity, self.soil_moisture, self.soil_ph]
    }

    /// Name of the first non-finite field, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        self.as_features()
            .iter()
            .position(|v| !v.is_finite())
            .map(|i| FEATURE_NAMES[i])
    }

    pub fn validate(&self) -> Result<()> {
        match self.non_finite_field() {
            Some(field) => Err(AgriError::InvalidReading(format!("{} is not a finite number", field))),
            None => Ok(()),
        }
    }
}

/// A soil reading labelled with the crop that suits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    #[serde(flatten)]
    pub reading: SoilReading,
    pub crop_name: String,
}

impl TrainingExample {
    pub fn new(reading: SoilReading, crop_name: impl Into<String>) -> Self {
        Self { reading, crop_name: crop_name.into() }
    }
}
