//! Current and historical sensor readings.

use axum::{
    extract::{Query, State},
    Json,
};
use agrisense_common::error::ApiError;
use agrisense_db::SensorData;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use crate::handlers::store_error;
use crate::state::SharedState;

const DEFAULT_HISTORY_DAYS: i64 = 7;
const MAX_HISTORY_DAYS: i64 = 365;

#[derive(Deserialize, Default)]
pub struct HistoryFilter {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SensorHistoryResponse {
    pub requested_days: i64,
    pub count: usize,
    pub readings: Vec<SensorData>,
}

/// GET /api/sensors/current: most recent reading
pub async fn current_sensor_data(
    State(state): State<SharedState>,
) -> Result<Json<SensorData>, ApiError> {
    state
        .db
        .latest_sensor_data()
        .await
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No sensor readings recorded yet".to_string()))
}

/// GET /api/sensors/history?days=N: readings from the last N days
pub async fn sensor_history(
    State(state): State<SharedState>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Json<SensorHistoryResponse>, ApiError> {
    let days = filter.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    if !(1..=MAX_HISTORY_DAYS).contains(&days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {}, got {}",
            MAX_HISTORY_DAYS, days
        )));
    }

    let readings = state
        .db
        .sensor_history(Utc::now() - Duration::days(days))
        .await
        .map_err(store_error)?;
    Ok(Json(SensorHistoryResponse {
        requested_days: days,
        count: readings.len(),
        readings,
    }))
}
