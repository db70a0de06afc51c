//! Multinomial logistic-regression crop classifier.
//!
//! Fitting is delegated to `linfa-logistic`; the fitted coefficients are then
//! copied into a plain serialisable struct so inference and persistence do
//! not depend on the solver's internal types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use linfa::traits::Fit;
use linfa::Dataset;
use linfa_logistic::MultiLogisticRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{RankerError, Result};

/// Solver settings for `CropClassifier::fit`.
#[derive(Debug, Clone)]
pub struct FitParams {
    pub max_iterations: u64,
    /// L2 penalty strength
    pub regularization: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self { max_iterations: 200, regularization: 1.0 }
    }
}

/// Fitted mapping from a scaled 4-vector to a probability per known crop.
///
/// `classes` is the sorted list of distinct training labels; index `k`
/// of every per-class vector refers to `classes[k]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropClassifier {
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    classes: Vec<String>,
    coefficients: Vec<[f64; 4]>,
    intercepts: Vec<f64>,
}

impl CropClassifier {
    /// Fit on already-scaled features. `labels[i]` is the crop of row `i`.
    pub fn fit(run_id: Uuid, scaled: Array2<f64>, labels: &[String], params: &FitParams) -> Result<Self> {
        if scaled.nrows() != labels.len() {
            return Err(RankerError::Fit(format!(
                "{} feature rows but {} labels",
                scaled.nrows(),
                labels.len()
            )));
        }

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if classes.len() < 2 {
            return Err(RankerError::InsufficientClasses { found: classes.len() });
        }

        // Class ids follow the sorted label order, which is also the
        // column order the solver assigns.
        let targets: Array1<usize> = labels
            .iter()
            .map(|l| classes.binary_search(l).map_err(|_| RankerError::Fit(format!("unknown label {}", l))))
            .collect::<Result<Vec<_>>>()?
            .into();

        let dataset = Dataset::new(scaled, targets);
        let fitted = MultiLogisticRegression::default()
            .alpha(params.regularization)
            .max_iterations(params.max_iterations)
            .fit(&dataset)
            .map_err(|e| RankerError::Fit(e.to_string()))?;

        let weights = fitted.params();
        let intercept = fitted.intercept();
        if weights.shape() != [4, classes.len()] || intercept.len() != classes.len() {
            return Err(RankerError::Fit(format!(
                "solver returned {:?} weights and {} intercepts for {} classes",
                weights.shape(),
                intercept.len(),
                classes.len()
            )));
        }

        let coefficients = (0..classes.len())
            .map(|k| [weights[[0, k]], weights[[1, k]], weights[[2, k]], weights[[3, k]]])
            .collect();
        debug!("Fitted classifier over {} crops", classes.len());

        let classifier = Self {
            run_id,
            trained_at: Utc::now(),
            classes,
            coefficients,
            intercepts: intercept.to_vec(),
        };
        classifier.validate()?;
        Ok(classifier)
    }

    /// Probability distribution over `classes()` for one scaled vector.
    pub fn predict_proba(&self, scaled: &[f64; 4]) -> Result<Vec<f64>> {
        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| b + w.iter().zip(scaled).map(|(w, x)| w * x).sum::<f64>())
            .collect();

        // Softmax, shifted by the max logit for stability.
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(RankerError::Inference("classifier produced non-finite scores".into()));
        }
        let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        let probabilities: Vec<f64> = exps.iter().map(|e| e / total).collect();

        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(RankerError::Inference("classifier produced non-finite probabilities".into()));
        }
        Ok(probabilities)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_name(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Structural consistency of a (possibly deserialised) classifier.
    pub fn validate(&self) -> Result<()> {
        let k = self.classes.len();
        if k < 2 {
            return Err(RankerError::CorruptArtifact(format!("classifier knows {} classes", k)));
        }
        if self.coefficients.len() != k || self.intercepts.len() != k {
            return Err(RankerError::CorruptArtifact(format!(
                "{} classes but {} coefficient rows and {} intercepts",
                k,
                self.coefficients.len(),
                self.intercepts.len()
            )));
        }
        let finite = self.coefficients.iter().flatten().chain(&self.intercepts).all(|v| v.is_finite());
        if !finite {
            return Err(RankerError::CorruptArtifact("classifier coefficients are not finite".into()));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn from_parts(classes: Vec<String>, coefficients: Vec<[f64; 4]>, intercepts: Vec<f64>) -> Self {
        Self { run_id: Uuid::nil(), trained_at: Utc::now(), classes, coefficients, intercepts }
    }
}
