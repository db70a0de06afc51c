//! Axum router: maps all URL paths to handlers.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    health::health_check,
    sensors::{current_sensor_data, sensor_history},
    predictions::{
        crop_recommendation_from_query, crop_recommendation_from_body,
        yield_prediction, irrigation_schedule, recommendation_history,
    },
    model::{model_status, train_model},
};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/health", get(health_check))

        // Sensors
        .route("/api/sensors/current", get(current_sensor_data))
        .route("/api/sensors/history", get(sensor_history))

        // Predictions
        .route(
            "/api/predictions/crop-recommendation",
            get(crop_recommendation_from_query).post(crop_recommendation_from_body),
        )
        .route("/api/predictions/yield",      get(yield_prediction))
        .route("/api/predictions/irrigation", get(irrigation_schedule))
        .route("/api/recommendations/history", get(recommendation_history))

        // Model
        .route("/api/model/status", get(model_status))
        .route("/api/model/train",  post(train_model))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
