//! agrisense-ranker: Crop-suitability ranking engine.
//!
//! Fits a feature scaler and a multinomial classifier on labelled soil
//! readings, then turns a raw reading into at most `top_k` crops whose
//! probability clears the confidence threshold.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agrisense_common::SoilReading;
//! use agrisense_ranker::{FileModelStore, RankerSettings, SuitabilityRanker};
//!
//! let store = Arc::new(FileModelStore::new("models/crop_recommendation_model.json", "models/crop_scaler.json"));
//! let ranker = SuitabilityRanker::load(store, RankerSettings::default());
//! for rec in ranker.predict(&SoilReading::new(22.0, 60.0, 45.0, 6.5)) {
//!     println!("{} {:.2}", rec.name, rec.confidence);
//! }
//! ```

pub mod error;
pub mod scaler;
pub mod classifier;
pub mod ranking;
pub mod store;
pub mod ranker;

pub use error::{RankerError, Result};
pub use scaler::FeatureScaler;
pub use classifier::{CropClassifier, FitParams};
pub use ranking::RankingPolicy;
pub use store::{FileModelStore, MemoryModelStore, ModelStore};
pub use ranker::{FittedModel, ModelStatus, RankerSettings, SuitabilityRanker, TrainOutcome};
