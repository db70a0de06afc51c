//! SQLite-backed tables and their queries.
//!
//! The store is a single in-memory SQLite connection; it lives as long as
//! the `Database` handle and is never written to disk.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{DbError, Result};
use crate::schema::{
    CropRecommendationRecord, IrrigationSchedule, IrrigationStatus, NewCropRecommendation,
    NewIrrigationSchedule, NewSensorData, SensorData, SoilConditions, CREATE_TABLES,
    TABLE_CROP_RECOMMENDATIONS, TABLE_IRRIGATION_SCHEDULES, TABLE_SENSOR_DATA,
};

const SENSOR_COLUMNS: &str =
    "id, timestamp, temperature, humidity, soil_moisture, pressure, sensor_id, location";
const RECOMMENDATION_COLUMNS: &str =
    "id, timestamp, crop_name, confidence, soil_temperature, soil_humidity, soil_moisture, soil_ph, location";
const IRRIGATION_COLUMNS: &str =
    "id, timestamp, scheduled_time, duration_minutes, status, reason, location";

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub sensor_data: usize,
    pub crop_recommendations: usize,
    pub irrigation_schedules: usize,
}

/// Main store handle. Share it behind an `Arc`.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

fn require_finite(table: &'static str, field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DbError::InvalidRecord { table, reason: format!("{} is not a finite number", field) })
    }
}

fn to_nanos(table: &'static str, at: DateTime<Utc>) -> Result<i64> {
    at.timestamp_nanos_opt().ok_or_else(|| DbError::InvalidRecord {
        table,
        reason: format!("timestamp {} is outside the storable range", at),
    })
}

fn sensor_from_row(row: &Row<'_>) -> rusqlite::Result<SensorData> {
    Ok(SensorData {
        id: row.get::<_, i64>(0)? as u64,
        timestamp: DateTime::from_timestamp_nanos(row.get(1)?),
        temperature: row.get(2)?,
        humidity: row.get(3)?,
        soil_moisture: row.get(4)?,
        pressure: row.get(5)?,
        sensor_id: row.get(6)?,
        location: row.get(7)?,
    })
}

fn recommendation_from_row(row: &Row<'_>) -> rusqlite::Result<CropRecommendationRecord> {
    Ok(CropRecommendationRecord {
        id: row.get::<_, i64>(0)? as u64,
        timestamp: DateTime::from_timestamp_nanos(row.get(1)?),
        crop_name: row.get(2)?,
        confidence: row.get(3)?,
        soil_conditions: SoilConditions {
            temperature: row.get(4)?,
            humidity: row.get(5)?,
            moisture: row.get(6)?,
            ph: row.get(7)?,
        },
        location: row.get(8)?,
    })
}

fn irrigation_from_row(row: &Row<'_>) -> rusqlite::Result<IrrigationSchedule> {
    Ok(IrrigationSchedule {
        id: row.get::<_, i64>(0)? as u64,
        timestamp: DateTime::from_timestamp_nanos(row.get(1)?),
        scheduled_time: DateTime::from_timestamp_nanos(row.get(2)?),
        duration_minutes: row.get(3)?,
        status: row.get(4)?,
        reason: row.get(5)?,
        location: row.get(6)?,
    })
}

impl Database {
    /// Open a fresh in-memory store with all tables created.
    pub fn new() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    // ── sensor_data ─────────────────────────────────────────────────────────

    pub async fn insert_sensor_data(&self, row: NewSensorData) -> Result<SensorData> {
        require_finite(TABLE_SENSOR_DATA, "temperature", row.temperature)?;
        require_finite(TABLE_SENSOR_DATA, "humidity", row.humidity)?;
        require_finite(TABLE_SENSOR_DATA, "soil_moisture", row.soil_moisture)?;
        require_finite(TABLE_SENSOR_DATA, "pressure", row.pressure)?;
        let timestamp = to_nanos(TABLE_SENSOR_DATA, row.timestamp)?;

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO sensor_data (timestamp, temperature, humidity, soil_moisture, pressure, sensor_id, location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                timestamp,
                row.temperature,
                row.humidity,
                row.soil_moisture,
                row.pressure,
                row.sensor_id,
                row.location,
            ],
        )?;
        Ok(SensorData {
            id: conn.last_insert_rowid() as u64,
            timestamp: row.timestamp,
            temperature: row.temperature,
            humidity: row.humidity,
            soil_moisture: row.soil_moisture,
            pressure: row.pressure,
            sensor_id: row.sensor_id,
            location: row.location,
        })
    }

    /// Most recent reading by timestamp; later inserts win ties.
    pub async fn latest_sensor_data(&self) -> Result<Option<SensorData>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM sensor_data ORDER BY timestamp DESC, id DESC LIMIT 1", SENSOR_COLUMNS),
                [],
                sensor_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Readings taken at or after `since`, newest first.
    pub async fn sensor_history(&self, since: DateTime<Utc>) -> Result<Vec<SensorData>> {
        let since = to_nanos(TABLE_SENSOR_DATA, since)?;
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sensor_data WHERE timestamp >= ?1 ORDER BY timestamp DESC, id DESC",
            SENSOR_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![since], sensor_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ── crop_recommendations ────────────────────────────────────────────────

    pub async fn insert_recommendation(&self, row: NewCropRecommendation) -> Result<CropRecommendationRecord> {
        if !(0.0..=1.0).contains(&row.confidence) {
            return Err(DbError::InvalidRecord {
                table: TABLE_CROP_RECOMMENDATIONS,
                reason: format!("confidence {} is outside [0, 1]", row.confidence),
            });
        }
        let soil = row.soil_conditions;
        for (field, value) in [
            ("temperature", soil.temperature),
            ("humidity", soil.humidity),
            ("moisture", soil.moisture),
            ("ph", soil.ph),
        ] {
            require_finite(TABLE_CROP_RECOMMENDATIONS, field, value)?;
        }
        let timestamp = to_nanos(TABLE_CROP_RECOMMENDATIONS, row.timestamp)?;

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO crop_recommendations
               (timestamp, crop_name, confidence, soil_temperature, soil_humidity, soil_moisture, soil_ph, location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                timestamp,
                row.crop_name,
                row.confidence,
                soil.temperature,
                soil.humidity,
                soil.moisture,
                soil.ph,
                row.location,
            ],
        )?;
        Ok(CropRecommendationRecord {
            id: conn.last_insert_rowid() as u64,
            timestamp: row.timestamp,
            crop_name: row.crop_name,
            confidence: row.confidence,
            soil_conditions: soil,
            location: row.location,
        })
    }

    /// Up to `limit` logged recommendations, newest first.
    pub async fn list_recommendations(&self, limit: usize) -> Result<Vec<CropRecommendationRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM crop_recommendations ORDER BY timestamp DESC, id DESC LIMIT ?1",
            RECOMMENDATION_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![limit], recommendation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ── irrigation_schedules ────────────────────────────────────────────────

    pub async fn insert_irrigation(&self, row: NewIrrigationSchedule) -> Result<IrrigationSchedule> {
        if row.duration_minutes == 0 {
            return Err(DbError::InvalidRecord {
                table: TABLE_IRRIGATION_SCHEDULES,
                reason: "duration must be at least one minute".into(),
            });
        }
        let timestamp = to_nanos(TABLE_IRRIGATION_SCHEDULES, row.timestamp)?;
        let scheduled_time = to_nanos(TABLE_IRRIGATION_SCHEDULES, row.scheduled_time)?;

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO irrigation_schedules (timestamp, scheduled_time, duration_minutes, status, reason, location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                timestamp,
                scheduled_time,
                row.duration_minutes,
                row.status,
                row.reason,
                row.location,
            ],
        )?;
        Ok(IrrigationSchedule {
            id: conn.last_insert_rowid() as u64,
            timestamp: row.timestamp,
            scheduled_time: row.scheduled_time,
            duration_minutes: row.duration_minutes,
            status: row.status,
            reason: row.reason,
            location: row.location,
        })
    }

    /// Earliest still-scheduled irrigation due at or after `now`.
    pub async fn next_irrigation(&self, now: DateTime<Utc>) -> Result<Option<IrrigationSchedule>> {
        let now = to_nanos(TABLE_IRRIGATION_SCHEDULES, now)?;
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM irrigation_schedules
                     WHERE status = ?1 AND scheduled_time >= ?2
                     ORDER BY scheduled_time ASC, id ASC LIMIT 1",
                    IRRIGATION_COLUMNS
                ),
                params![IrrigationStatus::Scheduled, now],
                irrigation_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub async fn update_irrigation_status(&self, id: u64, status: IrrigationStatus) -> Result<IrrigationSchedule> {
        let not_found = || DbError::NotFound(format!("irrigation schedule {}", id));
        let key = i64::try_from(id).map_err(|_| not_found())?;

        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE irrigation_schedules SET status = ?1 WHERE id = ?2",
            params![status, key],
        )?;
        if updated == 0 {
            return Err(not_found());
        }
        debug!("Irrigation {} -> {:?}", id, status);

        let schedule = conn.query_row(
            &format!("SELECT {} FROM irrigation_schedules WHERE id = ?1", IRRIGATION_COLUMNS),
            params![key],
            irrigation_from_row,
        )?;
        Ok(schedule)
    }

    pub async fn stats(&self) -> Result<DatabaseStats> {
        let conn = self.conn.lock().await;
        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            Ok(n as usize)
        };
        Ok(DatabaseStats {
            sensor_data: count(TABLE_SENSOR_DATA)?,
            crop_recommendations: count(TABLE_CROP_RECOMMENDATIONS)?,
            irrigation_schedules: count(TABLE_IRRIGATION_SCHEDULES)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reading(at: DateTime<Utc>, temperature: f64) -> NewSensorData {
        NewSensorData {
            timestamp: at,
            temperature,
            humidity: 60.0,
            soil_moisture: 45.0,
            pressure: 1013.0,
            sensor_id: "SENSOR_001".into(),
            location: "Field A".into(),
        }
    }

    #[tokio::test]
    async fn test_ids_autoincrement_per_table() {
        let db = Database::new().unwrap();
        let now = Utc::now();
        let a = db.insert_sensor_data(reading(now, 20.0)).await.unwrap();
        let b = db.insert_sensor_data(reading(now, 21.0)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let s = db
            .insert_irrigation(NewIrrigationSchedule {
                timestamp: now,
                scheduled_time: now,
                duration_minutes: 10,
                status: IrrigationStatus::Scheduled,
                reason: "test".into(),
                location: "Field B".into(),
            })
            .await
            .unwrap();
        assert_eq!(s.id, 1);
    }

    #[tokio::test]
    async fn test_latest_and_history() {
        let db = Database::new().unwrap();
        let now = Utc::now();
        db.insert_sensor_data(reading(now - Duration::hours(30), 18.0)).await.unwrap();
        db.insert_sensor_data(reading(now - Duration::hours(2), 22.0)).await.unwrap();
        db.insert_sensor_data(reading(now, 25.0)).await.unwrap();

        assert_eq!(db.latest_sensor_data().await.unwrap().unwrap().temperature, 25.0);

        let day = db.sensor_history(now - Duration::days(1)).await.unwrap();
        assert_eq!(day.iter().map(|r| r.temperature).collect::<Vec<_>>(), vec![25.0, 22.0]);
    }

    #[tokio::test]
    async fn test_rejects_non_finite_reading() {
        let db = Database::new().unwrap();
        let err = db.insert_sensor_data(reading(Utc::now(), f64::NAN)).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidRecord { table: "sensor_data", .. }));
        assert_eq!(db.stats().await.unwrap().sensor_data, 0);
    }

    #[tokio::test]
    async fn test_recommendation_confidence_bounds() {
        let db = Database::new().unwrap();
        let row = NewCropRecommendation {
            timestamp: Utc::now(),
            crop_name: "Rice".into(),
            confidence: 1.2,
            soil_conditions: SoilConditions { temperature: 20.0, humidity: 50.0, moisture: 40.0, ph: 6.0 },
            location: "Field A".into(),
        };
        assert!(db.insert_recommendation(row).await.is_err());
    }

    #[tokio::test]
    async fn test_next_irrigation_skips_past_and_cancelled() {
        let db = Database::new().unwrap();
        let now = Utc::now();
        let mk = |offset_h: i64, status| NewIrrigationSchedule {
            timestamp: now,
            scheduled_time: now + Duration::hours(offset_h),
            duration_minutes: 30,
            status,
            reason: "Soil moisture below optimal level".into(),
            location: "Field A".into(),
        };
        db.insert_irrigation(mk(-1, IrrigationStatus::Scheduled)).await.unwrap();
        let cancelled = db.insert_irrigation(mk(1, IrrigationStatus::Scheduled)).await.unwrap();
        let later = db.insert_irrigation(mk(3, IrrigationStatus::Scheduled)).await.unwrap();

        assert_eq!(db.next_irrigation(now).await.unwrap().unwrap().id, cancelled.id);
        db.update_irrigation_status(cancelled.id, IrrigationStatus::Cancelled).await.unwrap();
        assert_eq!(db.next_irrigation(now).await.unwrap().unwrap().id, later.id);

        assert!(matches!(
            db.update_irrigation_status(99, IrrigationStatus::Completed).await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_recommendations_newest_first_with_limit() {
        let db = Database::new().unwrap();
        let now = Utc::now();
        for (i, crop) in ["Rice", "Corn", "Wheat"].iter().enumerate() {
            db.insert_recommendation(NewCropRecommendation {
                timestamp: now - Duration::minutes(10 - i as i64),
                crop_name: crop.to_string(),
                confidence: 0.8,
                soil_conditions: SoilConditions { temperature: 20.0, humidity: 50.0, moisture: 40.0, ph: 6.5 },
                location: "Field A".into(),
            })
            .await
            .unwrap();
        }

        let rows = db.list_recommendations(2).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.crop_name.as_str()).collect::<Vec<_>>(), vec!["Wheat", "Corn"]);
        assert_eq!(rows[0].soil_conditions.ph, 6.5);
        assert_eq!(rows[0].timestamp, now - Duration::minutes(8));
    }

    #[tokio::test]
    async fn test_rows_round_trip_through_sqlite() {
        let db = Database::new().unwrap();
        let now = Utc::now();
        let inserted = db.insert_sensor_data(reading(now, 23.5)).await.unwrap();
        assert_eq!(db.latest_sensor_data().await.unwrap(), Some(inserted));

        let schedule = db
            .insert_irrigation(NewIrrigationSchedule {
                timestamp: now,
                scheduled_time: now + Duration::hours(1),
                duration_minutes: 45,
                status: IrrigationStatus::Scheduled,
                reason: "Dry spell".into(),
                location: "Greenhouse 1".into(),
            })
            .await
            .unwrap();
        let completed = db.update_irrigation_status(schedule.id, IrrigationStatus::Completed).await.unwrap();
        assert_eq!(completed, IrrigationSchedule { status: IrrigationStatus::Completed, ..schedule });
        assert!(db.next_irrigation(now).await.unwrap().is_none());

        assert_eq!(
            db.stats().await.unwrap(),
            DatabaseStats { sensor_data: 1, crop_recommendations: 0, irrigation_schedules: 1 }
        );
    }
}
