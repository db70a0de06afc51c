//! Record types for the three dashboard tables.

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

pub const TABLE_SENSOR_DATA: &str = "sensor_data";
pub const TABLE_CROP_RECOMMENDATIONS: &str = "crop_recommendations";
pub const TABLE_IRRIGATION_SCHEDULES: &str = "irrigation_schedules";

/// DDL for the three tables. Timestamps are stored as nanoseconds since the
/// Unix epoch so that `ORDER BY` on them is chronological.
pub(crate) const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS sensor_data (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      timestamp INTEGER NOT NULL,
      temperature REAL NOT NULL,
      humidity REAL NOT NULL,
      soil_moisture REAL NOT NULL,
      pressure REAL NOT NULL,
      sensor_id TEXT NOT NULL,
      location TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sensor_data_timestamp ON sensor_data (timestamp);
    CREATE INDEX IF NOT EXISTS idx_sensor_data_sensor_id ON sensor_data (sensor_id);

    CREATE TABLE IF NOT EXISTS crop_recommendations (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      timestamp INTEGER NOT NULL,
      crop_name TEXT NOT NULL,
      confidence REAL NOT NULL,
      soil_temperature REAL NOT NULL,
      soil_humidity REAL NOT NULL,
      soil_moisture REAL NOT NULL,
      soil_ph REAL NOT NULL,
      location TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_crop_recommendations_timestamp ON crop_recommendations (timestamp);

    CREATE TABLE IF NOT EXISTS irrigation_schedules (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      timestamp INTEGER NOT NULL,
      scheduled_time INTEGER NOT NULL,
      duration_minutes INTEGER NOT NULL,
      status TEXT NOT NULL,
      reason TEXT NOT NULL,
      location TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_irrigation_schedules_timestamp ON irrigation_schedules (timestamp);
";

// ── sensor_data ─────────────────────────────────────────────────────────────

/// One field sensor snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
    /// Barometric pressure (hPa)
    pub pressure: f64,
    pub sensor_id: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct NewSensorData {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
    pub pressure: f64,
    pub sensor_id: String,
    pub location: String,
}

// ── crop_recommendations ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
    pub ph: f64,
}

/// A logged recommendation together with the soil it was made for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendationRecord {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub crop_name: String,
    pub confidence: f64,
    pub soil_conditions: SoilConditions,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct NewCropRecommendation {
    pub timestamp: DateTime<Utc>,
    pub crop_name: String,
    pub confidence: f64,
    pub soil_conditions: SoilConditions,
    pub location: String,
}

// ── irrigation_schedules ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl IrrigationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrrigationStatus::Scheduled => "scheduled",
            IrrigationStatus::Completed => "completed",
            IrrigationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(IrrigationStatus::Scheduled),
            "completed" => Some(IrrigationStatus::Completed),
            "cancelled" => Some(IrrigationStatus::Cancelled),
            _ => None,
        }
    }
}

impl ToSql for IrrigationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for IrrigationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        IrrigationStatus::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationSchedule {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub status: IrrigationStatus,
    pub reason: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct NewIrrigationSchedule {
    pub timestamp: DateTime<Utc>,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub status: IrrigationStatus,
    pub reason: String,
    pub location: String,
}
