//! agrisense-common: Shared types and errors used across all AgriSense crates.

pub mod error;
pub mod soil;
pub mod recommendation;

// Re-export commonly used types
pub use soil::{SoilReading, TrainingExample, FEATURE_NAMES};
pub use recommendation::Recommendation;
