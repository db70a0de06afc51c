//! Crop recommendations, yield outlook and irrigation schedule.
//!
//! Recommendation routes always answer 200 for a well-formed request; an
//! untrained or failing model shows up as a sentinel entry in the list.

use axum::{
    extract::{Query, State},
    Json,
};
use agrisense_common::{error::ApiError, Recommendation, SoilReading};
use agrisense_db::{CropRecommendationRecord, SensorData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::handlers::store_error;
use crate::state::SharedState;

const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 100;

/// Soil reading supplied as query parameters; gaps are filled from the
/// latest sensor row and the configured default pH.
#[derive(Deserialize, Default, Debug)]
pub struct ReadingQuery {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub soil_ph: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CropRecommendationResponse {
    pub recommended_crops: Vec<Recommendation>,
    pub soil_conditions: SoilReading,
    pub timestamp: DateTime<Utc>,
}

fn respond(state: &SharedState, reading: SoilReading) -> Json<CropRecommendationResponse> {
    let recommended_crops = state.ranker.predict(&reading);
    debug!("{} crops recommended for {:?}", recommended_crops.len(), reading);
    Json(CropRecommendationResponse {
        recommended_crops,
        soil_conditions: reading,
        timestamp: Utc::now(),
    })
}

fn fill(
    given: Option<f64>,
    latest: Option<&SensorData>,
    name: &str,
    from_sensor: impl Fn(&SensorData) -> f64,
) -> Result<f64, ApiError> {
    given
        .or_else(|| latest.map(from_sensor))
        .ok_or_else(|| ApiError::BadRequest(format!("{} not given and no sensor readings recorded", name)))
}

/// GET /api/predictions/crop-recommendation
pub async fn crop_recommendation_from_query(
    State(state): State<SharedState>,
    Query(query): Query<ReadingQuery>,
) -> Result<Json<CropRecommendationResponse>, ApiError> {
    let needs_sensor = query.temperature.is_none() || query.humidity.is_none() || query.soil_moisture.is_none();
    let latest = if needs_sensor {
        state.db.latest_sensor_data().await.map_err(store_error)?
    } else {
        None
    };
    let latest = latest.as_ref();

    let reading = SoilReading {
        temperature: fill(query.temperature, latest, "temperature", |s| s.temperature)?,
        humidity: fill(query.humidity, latest, "humidity", |s| s.humidity)?,
        soil_moisture: fill(query.soil_moisture, latest, "soil_moisture", |s| s.soil_moisture)?,
        soil_ph: query.soil_ph.unwrap_or(state.config.model.default_soil_ph),
    };

    Ok(respond(&state, reading))
}

/// POST /api/predictions/crop-recommendation: body is a SoilReading
pub async fn crop_recommendation_from_body(
    State(state): State<SharedState>,
    Json(reading): Json<SoilReading>,
) -> Json<CropRecommendationResponse> {
    respond(&state, reading)
}

#[derive(Debug, Serialize)]
pub struct YieldEstimate {
    pub value: f64,
    pub unit: &'static str,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub struct YieldResponse {
    pub predicted_yield: YieldEstimate,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/predictions/yield: fixed placeholder estimate
pub async fn yield_prediction() -> Json<YieldResponse> {
    Json(YieldResponse {
        predicted_yield: YieldEstimate { value: 85.5, unit: "tons/hectare", confidence: 0.82 },
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Serialize)]
pub struct NextIrrigation {
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub reason: String,
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct IrrigationResponse {
    pub next_irrigation: Option<NextIrrigation>,
    pub current_status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/predictions/irrigation: next scheduled irrigation
pub async fn irrigation_schedule(
    State(state): State<SharedState>,
) -> Result<Json<IrrigationResponse>, ApiError> {
    let now = Utc::now();
    let next_irrigation = state.db.next_irrigation(now).await.map_err(store_error)?.map(|s| NextIrrigation {
        scheduled_time: s.scheduled_time,
        duration_minutes: s.duration_minutes,
        reason: s.reason,
        location: s.location,
    });

    Ok(Json(IrrigationResponse {
        next_irrigation,
        current_status: "Monitoring",
        timestamp: now,
    }))
}

#[derive(Deserialize, Default)]
pub struct HistoryFilter {
    pub limit: Option<usize>,
}

/// GET /api/recommendations/history?limit=N: logged recommendations
pub async fn recommendation_history(
    State(state): State<SharedState>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Json<Vec<CropRecommendationRecord>>, ApiError> {
    let limit = filter.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
    let records = state.db.list_recommendations(limit).await.map_err(store_error)?;
    Ok(Json(records))
}
