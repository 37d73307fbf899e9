// HTTP-level tests for the sentiment server.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hybrid_sentiment::pipelines::sentiment::*;
use hybrid_sentiment::server::{create_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

struct AlwaysPositive;

impl TextClassifier for AlwaysPositive {
    fn classify(&self, _text: &str) -> anyhow::Result<Vec<ClassScore>> {
        Ok(vec![
            ClassScore {
                label: "NEGATIVE".into(),
                score: 0.25,
            },
            ClassScore {
                label: "POSITIVE".into(),
                score: 0.75,
            },
        ])
    }

    fn source(&self) -> &str {
        "always-positive"
    }
}

struct FixedLoader;

impl ModelLoader for FixedLoader {
    fn load(&self) -> anyhow::Result<Arc<dyn TextClassifier>> {
        Ok(Arc::new(AlwaysPositive))
    }
}

fn router(engine: SentimentEngine) -> Router {
    create_router(AppState::new(Arc::new(engine)))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn enable_with_corrupt_model_dir_returns_detail() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("config.json"), "{ not json")?;
    std::fs::write(dir.path().join("model.safetensors"), b"garbage")?;

    let engine = SentimentEngineBuilder::new()
        .model_path(dir.path())
        .cpu()
        .build()
        .await;
    let app = router(engine);

    let (status, body) = send(&app, post("/enable-ml-model", "")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Failed to enable ML model:"), "{detail}");

    // Still answering from the lexicon.
    let (status, body) = send(&app, post("/predict", r#"{"text": "This is amazing!"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "positive");
    assert!((body["score"].as_f64().unwrap() - 0.8).abs() < 1e-6);

    let (_, body) = send(&app, get("/model-status")).await;
    assert_eq!(body["mode"], "lexicon");
    assert_eq!(body["model_loaded"], false);
    assert!(body["last_error"].is_string());
    Ok(())
}

#[tokio::test]
async fn enable_switches_predictions_to_model() {
    let engine = SentimentEngineBuilder::new().loader(FixedLoader).build().await;
    let app = router(engine);

    let (_, body) = send(&app, post("/predict", r#"{"text": "I hate this product"}"#)).await;
    assert_eq!(body["label"], "negative");

    let (status, body) = send(&app, post("/enable-ml-model", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ML model enabled successfully");

    let (_, body) = send(&app, post("/predict", r#"{"text": "I hate this product"}"#)).await;
    assert_eq!(body["label"], "positive");
    assert!((body["score"].as_f64().unwrap() - 0.75).abs() < 1e-6);

    let (_, body) = send(&app, get("/model-status")).await;
    assert_eq!(body["mode"], "model");
    assert_eq!(body["using_ml_model"], true);
    assert_eq!(body["model_type"], "ML (DistilBERT)");
    assert_eq!(body["model_source"], "always-positive");

    // Enabling again is a no-op success.
    let (status, _) = send(&app, post("/enable-ml-model", "")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn debug_predict_reports_lexicon_even_in_model_mode() {
    let engine = SentimentEngineBuilder::new()
        .use_ml_model(true)
        .loader(FixedLoader)
        .build()
        .await;
    let app = router(engine);

    let (_, body) = send(&app, post("/debug-predict", r#"{"text": "awful, just awful"}"#)).await;
    assert_eq!(body["negative_count"], 2);
    assert_eq!(body["negative_words_found"][1], "awful");
    assert_eq!(body["prediction"]["label"], "positive");
}
