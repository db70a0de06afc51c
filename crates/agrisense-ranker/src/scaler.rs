//! Per-feature standardisation fitted alongside the classifier.

use agrisense_common::FEATURE_NAMES;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RankerError, Result};

/// Fitted mean/standard-deviation transform over the four soil features.
///
/// Coefficients are frozen at fit time; every later transform uses them
/// unchanged. `run_id` ties the scaler to the classifier it was fitted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub run_id: Uuid,
    mean: [f64; 4],
    /// Population standard deviation per feature
    scale: [f64; 4],
    n_samples: usize,
}

impl FeatureScaler {
    /// Fit on an `n × 4` feature matrix.
    pub fn fit(run_id: Uuid, features: &Array2<f64>) -> Result<Self> {
        if features.ncols() != FEATURE_NAMES.len() {
            return Err(RankerError::Fit(format!(
                "expected {} feature columns, got {}",
                FEATURE_NAMES.len(),
                features.ncols()
            )));
        }
        let mean = features
            .mean_axis(Axis(0))
            .ok_or(RankerError::EmptyTrainingSet)?;
        let std = features.std_axis(Axis(0), 0.0);

        let mut scaler = Self {
            run_id,
            mean: [0.0; 4],
            scale: [1.0; 4],
            n_samples: features.nrows(),
        };
        for j in 0..FEATURE_NAMES.len() {
            let (m, s) = (mean[j], std[j]);
            if !s.is_finite() || s <= 1e-12 * m.abs().max(1.0) {
                return Err(RankerError::DegenerateFeature { feature: FEATURE_NAMES[j] });
            }
            scaler.mean[j] = m;
            scaler.scale[j] = s;
        }
        Ok(scaler)
    }

    /// Standardise a single feature vector.
    pub fn transform(&self, features: &[f64; 4]) -> Result<[f64; 4]> {
        let mut out = [0.0; 4];
        for j in 0..4 {
            out[j] = (features[j] - self.mean[j]) / self.scale[j];
            if !out[j].is_finite() {
                return Err(RankerError::Inference(format!(
                    "scaled {} is not finite",
                    FEATURE_NAMES[j]
                )));
            }
        }
        Ok(out)
    }

    /// Standardise every row of an `n × 4` matrix.
    pub fn transform_matrix(&self, features: &Array2<f64>) -> Array2<f64> {
        let mut scaled = features.to_owned();
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let (m, s) = (self.mean[j], self.scale[j]);
            column.mapv_inplace(|v| (v - m) / s);
        }
        scaled
    }

    pub fn mean(&self) -> &[f64; 4] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64; 4] {
        &self.scale
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Reject coefficients that could not have come out of `fit`.
    pub fn validate(&self) -> Result<()> {
        let ok = self.mean.iter().all(|m| m.is_finite())
            && self.scale.iter().all(|s| s.is_finite() && *s > 0.0);
        if ok {
            Ok(())
        } else {
            Err(RankerError::CorruptArtifact("scaler coefficients are not finite and positive".into()))
        }
    }
}
