//! HTTP front of the sentiment engine.
//!
//! | Route              | Method | Body       | Response                          |
//! |--------------------|--------|------------|-----------------------------------|
//! | `/predict`         | POST   | `{"text"}` | `{"label", "score"}`              |
//! | `/enable-ml-model` | POST   |            | `{"message"}` or 500 `{"detail"}` |
//! | `/debug-predict`   | POST   | `{"text"}` | lexicon breakdown + prediction    |
//! | `/model-status`    | GET    |            | mode, load state, model type      |
//! | `/health`          | GET    |            | `{"status": "healthy"}`           |

pub mod handlers;

use crate::pipelines::sentiment::SentimentEngine;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SentimentEngine>,
}

impl AppState {
    pub fn new(engine: Arc<SentimentEngine>) -> Self {
        Self { engine }
    }
}

/// Builds the router with permissive CORS and request tracing.
///
/// ```rust,no_run
/// use hybrid_sentiment::pipelines::sentiment::SentimentEngineBuilder;
/// use hybrid_sentiment::server::{create_router, AppState};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let engine = Arc::new(SentimentEngineBuilder::new().build().await);
///     let router = create_router(AppState::new(engine));
///
///     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
///     axum::serve(listener, router).await?;
///     Ok(())
/// }
/// ```
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/enable-ml-model", post(handlers::enable_ml_model))
        .route("/debug-predict", post(handlers::debug_predict))
        .route("/model-status", get(handlers::model_status))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
