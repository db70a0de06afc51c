//! agrisense-web: HTTP API for the farm-monitoring dashboard
//! Provides:
//!   - Health check
//!   - Current and historical sensor readings
//!   - Crop recommendations from the suitability ranker
//!   - Yield and irrigation outlook
//!   - Model status and training

pub mod router;
pub mod handlers;
pub mod state;
