//! AgriSense record store
//!
//! An in-memory SQLite store for the dashboard's three record types:
//! sensor readings, the crop-recommendation log, and irrigation schedules.
//! Nothing is written to disk; the store lives as long as the process.
//!
//! # Example
//!
//! ```rust,no_run
//! use agrisense_db::{Database, seed_demo_data};
//! use rand::SeedableRng;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new()?;
//!     let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!     seed_demo_data(&db, &mut rng).await?;
//!
//!     let latest = db.latest_sensor_data().await?;
//!     println!("{:?}", latest);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod schema;
pub mod seed;

pub use database::{Database, DatabaseStats};
pub use error::{DbError, Result};
pub use schema::{
    CropRecommendationRecord, IrrigationSchedule, IrrigationStatus, NewCropRecommendation,
    NewIrrigationSchedule, NewSensorData, SensorData, SoilConditions,
};
pub use seed::seed_demo_data;
