//! Random demo rows for an empty store.

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::database::{Database, DatabaseStats};
use crate::error::Result;
use crate::schema::{
    IrrigationStatus, NewCropRecommendation, NewIrrigationSchedule, NewSensorData, SoilConditions,
};

pub const DEMO_LOCATIONS: [&str; 3] = ["Field A", "Field B", "Greenhouse 1"];
pub const DEMO_CROPS: [&str; 5] = ["Tomato", "Potato", "Corn", "Wheat", "Rice"];

const SENSOR_HOURS: i64 = 24;
const RECOMMENDATION_ROWS: usize = 5;

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Fill an empty store with a day of hourly sensor readings, a handful of
/// logged recommendations and one upcoming irrigation.
///
/// Does nothing when sensor data is already present.
pub async fn seed_demo_data<R: Rng + ?Sized>(db: &Database, rng: &mut R) -> Result<DatabaseStats> {
    let existing = db.stats().await?;
    if existing.sensor_data > 0 {
        info!("Record store already populated; skipping demo seed");
        return Ok(existing);
    }

    let now = Utc::now();
    let sensor_ids: Vec<String> = (1..=3).map(|i| format!("SENSOR_{:03}", i)).collect();

    for hour in 0..SENSOR_HOURS {
        let sensor_id = sensor_ids.choose(rng).cloned().unwrap_or_default();
        db.insert_sensor_data(NewSensorData {
            timestamp: now - Duration::hours(hour),
            temperature: rng.gen_range(20.0..30.0),
            humidity: rng.gen_range(40.0..80.0),
            soil_moisture: rng.gen_range(30.0..70.0),
            pressure: rng.gen_range(980.0..1020.0),
            sensor_id,
            location: pick(rng, &DEMO_LOCATIONS).to_string(),
        })
        .await?;
    }

    for _ in 0..RECOMMENDATION_ROWS {
        let ph: f64 = rng.gen_range(5.5..7.5);
        db.insert_recommendation(NewCropRecommendation {
            timestamp: now,
            crop_name: pick(rng, &DEMO_CROPS).to_string(),
            confidence: rng.gen_range(0.7..0.95),
            soil_conditions: SoilConditions {
                temperature: rng.gen_range(18.0..28.0),
                humidity: rng.gen_range(40.0..80.0),
                moisture: rng.gen_range(30.0..70.0),
                ph: (ph * 10.0).round() / 10.0,
            },
            location: pick(rng, &DEMO_LOCATIONS).to_string(),
        })
        .await?;
    }

    db.insert_irrigation(NewIrrigationSchedule {
        timestamp: now,
        scheduled_time: now + Duration::hours(2),
        duration_minutes: 30,
        status: IrrigationStatus::Scheduled,
        reason: "Soil moisture below optimal level".to_string(),
        location: pick(rng, &DEMO_LOCATIONS).to_string(),
    })
    .await?;

    let stats = db.stats().await?;
    info!(
        "Seeded demo data: {} sensor readings, {} recommendations, {} irrigation schedules",
        stats.sensor_data, stats.crop_recommendations, stats.irrigation_schedules
    );
    Ok(stats)
}
