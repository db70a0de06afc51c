//! The suitability ranker: owns the fitted pair and exposes `train` / `predict`.
//!
//! Both operations are total. Training failures come back as
//! `TrainOutcome::Failed`, inference failures as a sentinel recommendation.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use agrisense_common::{Recommendation, SoilReading, TrainingExample, FEATURE_NAMES};
use agrisense_config::ModelConfig;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::{CropClassifier, FitParams};
use crate::error::{RankerError, Result};
use crate::ranking::RankingPolicy;
use crate::scaler::FeatureScaler;
use crate::store::ModelStore;

#[derive(Debug, Clone, Default)]
pub struct RankerSettings {
    pub policy: RankingPolicy,
    pub fit: FitParams,
}

impl From<&ModelConfig> for RankerSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            policy: RankingPolicy {
                top_k: config.top_k,
                min_confidence: config.min_confidence,
            },
            fit: FitParams {
                max_iterations: config.max_iterations,
                regularization: config.regularization,
            },
        }
    }
}

/// A scaler and the classifier fitted alongside it. Immutable once built.
#[derive(Debug)]
pub struct FittedModel {
    pub scaler: FeatureScaler,
    pub classifier: CropClassifier,
}

impl FittedModel {
    /// Pair up two artifacts, refusing ones from different training runs.
    pub fn from_parts(scaler: FeatureScaler, classifier: CropClassifier) -> Result<Self> {
        if scaler.run_id != classifier.run_id {
            return Err(RankerError::ArtifactMismatch {
                classifier: classifier.run_id,
                scaler: scaler.run_id,
            });
        }
        scaler.validate()?;
        classifier.validate()?;
        Ok(Self { scaler, classifier })
    }

    pub fn run_id(&self) -> Uuid {
        self.classifier.run_id
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.classifier.trained_at
    }
}

/// Result of a `train` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrainOutcome {
    /// New pair installed. `persist_error` is set when the durable write failed.
    Trained {
        run_id: Uuid,
        classes: Vec<String>,
        persist_error: Option<String>,
    },
    /// Nothing changed.
    Failed { reason: String },
}

impl TrainOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, TrainOutcome::Trained { .. })
    }
}

/// Snapshot of the ranker for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub trained: bool,
    pub classes: Vec<String>,
    pub run_id: Option<Uuid>,
    pub trained_at: Option<DateTime<Utc>>,
}

pub struct SuitabilityRanker {
    /// `None` is the untrained state.
    model: RwLock<Option<Arc<FittedModel>>>,
    /// Serialises `train` calls so their durable writes never interleave.
    training: Mutex<()>,
    store: Arc<dyn ModelStore>,
    settings: RankerSettings,
}

impl std::fmt::Debug for SuitabilityRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuitabilityRanker")
            .field("store", &self.store.describe())
            .field("settings", &self.settings)
            .field("trained", &self.is_trained())
            .finish()
    }
}

impl SuitabilityRanker {
    /// An untrained ranker. Does not touch the store.
    pub fn new(store: Arc<dyn ModelStore>, settings: RankerSettings) -> Self {
        Self {
            model: RwLock::new(None),
            training: Mutex::new(()),
            store,
            settings,
        }
    }

    /// A ranker initialised from whatever pair the store holds.
    /// Falls back to untrained when the pair is missing, unreadable or mismatched.
    pub fn load(store: Arc<dyn ModelStore>, settings: RankerSettings) -> Self {
        let ranker = Self::new(store, settings);
        let location = ranker.store.describe();

        match ranker.store.load().and_then(|pair| pair.map(|(s, c)| FittedModel::from_parts(s, c)).transpose()) {
            Ok(Some(model)) => {
                info!(
                    "Loaded crop model {} ({} crops) from {}",
                    model.run_id(),
                    model.classifier.classes().len(),
                    location
                );
                ranker.install(Arc::new(model));
            }
            Ok(None) => info!("No persisted crop model at {}; starting untrained", location),
            Err(e) => warn!("Failed to load crop model from {}: {}; starting untrained", location, e),
        }
        ranker
    }

    pub fn settings(&self) -> &RankerSettings {
        &self.settings
    }

    fn snapshot(&self) -> Option<Arc<FittedModel>> {
        // The slot only ever holds a complete pair, so a poisoned lock
        // still guards a consistent value.
        self.model.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn install(&self, model: Arc<FittedModel>) {
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = Some(model);
    }

    pub fn is_trained(&self) -> bool {
        self.snapshot().is_some()
    }

    pub fn status(&self) -> ModelStatus {
        match self.snapshot() {
            Some(model) => ModelStatus {
                trained: true,
                classes: model.classifier.classes().to_vec(),
                run_id: Some(model.run_id()),
                trained_at: Some(model.trained_at()),
            },
            None => ModelStatus { trained: false, classes: Vec::new(), run_id: None, trained_at: None },
        }
    }

    /// Fit a new pair on `examples` and install it.
    pub fn train(&self, examples: &[TrainingExample]) -> TrainOutcome {
        let _guard = self.training.lock().unwrap_or_else(PoisonError::into_inner);

        let model = match fit_model(examples, &self.settings.fit) {
            Ok(model) => Arc::new(model),
            Err(e) => {
                warn!("Training rejected ({} examples): {}", examples.len(), e);
                return TrainOutcome::Failed { reason: e.to_string() };
            }
        };

        self.install(Arc::clone(&model));
        let classes = model.classifier.classes().to_vec();
        info!(
            "Trained crop model {} on {} examples over {} crops",
            model.run_id(),
            examples.len(),
            classes.len()
        );

        let persist_error = match self.store.save(&model.scaler, &model.classifier) {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to persist crop model to {}: {}", self.store.describe(), e);
                Some(e.to_string())
            }
        };

        TrainOutcome::Trained { run_id: model.run_id(), classes, persist_error }
    }

    /// Ranked crops for `reading`; 0–`top_k` entries, or one sentinel.
    pub fn predict(&self, reading: &SoilReading) -> Vec<Recommendation> {
        let Some(model) = self.snapshot() else {
            return vec![Recommendation::not_trained()];
        };

        match self.rank(&model, reading) {
            Ok(recommendations) => {
                debug!("Ranked {} crops for {:?}", recommendations.len(), reading);
                recommendations
            }
            Err(e) => {
                warn!("Prediction failed: {}", e);
                vec![Recommendation::error(e)]
            }
        }
    }

    fn rank(&self, model: &FittedModel, reading: &SoilReading) -> Result<Vec<Recommendation>> {
        if let Some(field) = reading.non_finite_field() {
            return Err(RankerError::Inference(format!("{} is not a finite number", field)));
        }
        let scaled = model.scaler.transform(&reading.as_features())?;
        let probabilities = model.classifier.predict_proba(&scaled)?;

        self.settings
            .policy
            .select(&probabilities)
            .into_iter()
            .map(|(index, confidence)| {
                let crop = model.classifier.class_name(index).ok_or_else(|| {
                    RankerError::Inference(format!("class index {} out of range", index))
                })?;
                Ok(Recommendation::for_crop(crop, confidence, reading))
            })
            .collect()
    }
}

/// Validate `examples` and fit a fresh scaler/classifier pair on them.
pub fn fit_model(examples: &[TrainingExample], params: &FitParams) -> Result<FittedModel> {
    if examples.is_empty() {
        return Err(RankerError::EmptyTrainingSet);
    }

    let mut flat = Vec::with_capacity(examples.len() * FEATURE_NAMES.len());
    let mut labels = Vec::with_capacity(examples.len());
    for (index, example) in examples.iter().enumerate() {
        if example.crop_name.trim().is_empty() {
            return Err(RankerError::BlankLabel { index });
        }
        if let Some(field) = example.reading.non_finite_field() {
            return Err(RankerError::NonFinite { index, field });
        }
        flat.extend_from_slice(&example.reading.as_features());
        labels.push(example.crop_name.clone());
    }

    let distinct = labels.iter().collect::<std::collections::BTreeSet<_>>().len();
    if distinct < 2 {
        return Err(RankerError::InsufficientClasses { found: distinct });
    }

    let features = Array2::from_shape_vec((examples.len(), FEATURE_NAMES.len()), flat)
        .map_err(|e| RankerError::Fit(e.to_string()))?;

    let run_id = Uuid::new_v4();
    let scaler = FeatureScaler::fit(run_id, &features)?;
    let scaled = scaler.transform_matrix(&features);
    let classifier = CropClassifier::fit(run_id, scaled, &labels, params)?;

    FittedModel::from_parts(scaler, classifier)
}
