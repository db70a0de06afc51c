//! Model status and training.

use axum::{extract::State, Json};
use agrisense_common::{error::ApiError, TrainingExample};
use agrisense_ranker::{ModelStatus, TrainOutcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    pub examples: Vec<TrainingExample>,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub trained: bool,
    pub classes: Vec<String>,
    pub run_id: Option<Uuid>,
    pub persisted: bool,
    pub message: String,
}

impl From<TrainOutcome> for TrainResponse {
    fn from(outcome: TrainOutcome) -> Self {
        match outcome {
            TrainOutcome::Trained { run_id, classes, persist_error } => {
                let message = match &persist_error {
                    None => format!("Model trained on {} crops", classes.len()),
                    Some(e) => format!("Model trained on {} crops but could not be saved: {}", classes.len(), e),
                };
                Self {
                    trained: true,
                    classes,
                    run_id: Some(run_id),
                    persisted: persist_error.is_none(),
                    message,
                }
            }
            TrainOutcome::Failed { reason } => Self {
                trained: false,
                classes: Vec::new(),
                run_id: None,
                persisted: false,
                message: format!("Training failed: {}", reason),
            },
        }
    }
}

/// GET /api/model/status
pub async fn model_status(State(state): State<SharedState>) -> Json<ModelStatus> {
    Json(state.ranker.status())
}

/// POST /api/model/train: fit a new model; runs on the blocking pool
pub async fn train_model(
    State(state): State<SharedState>,
    Json(request): Json<TrainRequest>,
) -> Result<Json<TrainResponse>, ApiError> {
    let ranker = state.ranker.clone();
    let outcome = tokio::task::spawn_blocking(move || ranker.train(&request.examples))
        .await
        .map_err(|e| ApiError::Internal(format!("training task aborted: {}", e)))?;

    Ok(Json(TrainResponse::from(outcome)))
}
