use super::AppState;
use crate::core::{SentimentError, SentimentResult};
use crate::pipelines::sentiment::{EngineMode, LexiconAnalysis};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DebugPredictionResponse {
    pub text: String,
    #[serde(flatten)]
    pub analysis: LexiconAnalysis,
    pub prediction: SentimentResult,
}

#[derive(Debug, Serialize)]
pub struct ModelStatusResponse {
    pub mode: EngineMode,
    pub model_loaded: bool,
    pub using_ml_model: bool,
    pub model_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error body in the `{"detail": ...}` shape clients of this API expect.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<SentimentError> for ApiError {
    fn from(err: SentimentError) -> Self {
        let detail = match &err {
            SentimentError::ModelLoad(reason) => format!("Failed to enable ML model: {reason}"),
            other => other.to_string(),
        };
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.detail }));
        (self.status, body).into_response()
    }
}

pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictionRequest>,
) -> Json<SentimentResult> {
    Json(state.engine.predict(&request.text).await)
}

pub async fn enable_ml_model(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine.enable_model_mode().await?;
    Ok(Json(MessageResponse {
        message: "ML model enabled successfully",
    }))
}

pub async fn debug_predict(
    State(state): State<AppState>,
    Json(request): Json<PredictionRequest>,
) -> Json<DebugPredictionResponse> {
    let analysis = state.engine.analyze(&request.text);
    let prediction = state.engine.predict(&request.text).await;

    Json(DebugPredictionResponse {
        text: request.text,
        analysis,
        prediction,
    })
}

pub async fn model_status(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    let status = state.engine.status().await;
    let using_ml_model = status.mode == EngineMode::Model;

    Json(ModelStatusResponse {
        mode: status.mode,
        model_loaded: status.model_loaded,
        using_ml_model,
        model_type: if using_ml_model {
            "ML (DistilBERT)"
        } else {
            "Simple rules"
        },
        model_source: status.model_source,
        last_error: status.last_error,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}
