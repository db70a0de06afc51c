//! Error types for the ranking engine.

use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, RankerError>;

#[derive(Error, Debug)]
pub enum RankerError {
    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Example {index} has a blank crop name")]
    BlankLabel { index: usize },

    #[error("Example {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },

    #[error("Need at least 2 distinct crops to train, found {found}")]
    InsufficientClasses { found: usize },

    #[error("Feature {feature} has zero variance across the training set")]
    DegenerateFeature { feature: &'static str },

    #[error("Model fitting failed: {0}")]
    Fit(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Model artifacts come from different training runs (classifier {classifier}, scaler {scaler})")]
    ArtifactMismatch { classifier: Uuid, scaler: Uuid },

    #[error("Corrupt model artifact: {0}")]
    CorruptArtifact(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
