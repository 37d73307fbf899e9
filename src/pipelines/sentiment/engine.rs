//! The hybrid engine controller.
//!
//! Owns the lexicon scorer, the optional model scorer and the current mode.
//! `predict` never fails: model-side failures fall back to the lexicon for that
//! one call. Loading is serialized so at most one load is in flight, and the
//! state is swapped in a single write so readers never see a half-loaded model.

use super::lexicon::{LexiconAnalysis, LexiconScorer};
use super::model::ModelLoader;
use super::scorer::ModelScorer;
use crate::core::{Result, SentimentError, SentimentResult};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Which scorer answers `predict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    #[default]
    Lexicon,
    Model,
}

/// Lifecycle of the classification model.
#[derive(Debug, Clone, Default)]
pub enum ModelState {
    #[default]
    NotLoaded,
    Loaded(ModelScorer),
    FailedToLoad(String),
}

impl ModelState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Loaded(_))
    }

    fn scorer(&self) -> Result<&ModelScorer> {
        match self {
            ModelState::Loaded(scorer) => Ok(scorer),
            ModelState::NotLoaded | ModelState::FailedToLoad(_) => {
                Err(SentimentError::ModelUnavailable)
            }
        }
    }
}

/// Snapshot returned by [`SentimentEngine::status`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub mode: EngineMode,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct EngineState {
    mode: EngineMode,
    model: ModelState,
    /// Number of completed load attempts.
    load_attempts: u64,
}

/// Shared with the load task so a load always runs to completion and records
/// its outcome, even when the caller that started it goes away.
struct LoadShared {
    loader: Arc<dyn ModelLoader>,
    state: RwLock<EngineState>,
    load_lock: Mutex<()>,
}

pub struct SentimentEngine {
    lexicon: LexiconScorer,
    shared: Arc<LoadShared>,
}

impl SentimentEngine {
    /// Creates an engine in lexicon mode. Use
    /// [`SentimentEngineBuilder`](super::SentimentEngineBuilder) for config-driven setup.
    pub fn new(lexicon: LexiconScorer, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            lexicon,
            shared: Arc::new(LoadShared {
                loader,
                state: RwLock::new(EngineState::default()),
                load_lock: Mutex::new(()),
            }),
        }
    }

    /// Scores `text` with the active scorer. Always returns a result.
    pub async fn predict(&self, text: &str) -> SentimentResult {
        let scorer = {
            let state = self.shared.state.read().await;
            match state.mode {
                EngineMode::Lexicon => None,
                EngineMode::Model => Some(state.model.scorer().cloned()),
            }
        };

        let Some(scorer) = scorer else {
            debug!("scoring with lexicon");
            return self.lexicon.score(text);
        };

        match Self::score_with_model(scorer, text).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "model prediction failed, falling back to lexicon");
                self.lexicon.score(text)
            }
        }
    }

    async fn score_with_model(
        scorer: Result<ModelScorer>,
        text: &str,
    ) -> Result<SentimentResult> {
        let scorer = scorer?;
        let text = text.to_owned();

        tokio::task::spawn_blocking(move || scorer.score(&text))
            .await
            .map_err(|e| SentimentError::Inference(format!("inference task failed: {e}")))?
    }

    /// Lexicon breakdown for `text`, independent of the active mode.
    pub fn analyze(&self, text: &str) -> LexiconAnalysis {
        self.lexicon.analyze(text)
    }

    /// Switches to model mode, loading the model first if needed.
    ///
    /// The load runs on its own task: dropping this future (client disconnect,
    /// timeout) does not abort it, and a later call waits for it instead of
    /// starting another one.
    pub async fn enable_model_mode(&self) -> Result<()> {
        let observed_attempts = self.shared.state.read().await.load_attempts;
        let shared = Arc::clone(&self.shared);

        tokio::spawn(shared.enable(observed_attempts))
            .await
            .map_err(|e| SentimentError::ModelLoad(format!("model loading task failed: {e}")))?
    }

    /// Current mode and model state. No side effects.
    pub async fn status(&self) -> EngineStatus {
        let state = self.shared.state.read().await;
        let (model_source, last_error) = match &state.model {
            ModelState::Loaded(scorer) => (Some(scorer.source().to_string()), None),
            ModelState::FailedToLoad(reason) => (None, Some(reason.clone())),
            ModelState::NotLoaded => (None, None),
        };

        EngineStatus {
            mode: state.mode,
            model_loaded: state.model.is_loaded(),
            model_source,
            last_error,
        }
    }
}

impl LoadShared {
    async fn enable(self: Arc<Self>, observed_attempts: u64) -> Result<()> {
        let _load_guard = self.load_lock.lock().await;

        {
            let mut state = self.state.write().await;
            if state.mode == EngineMode::Model {
                debug!("model mode already enabled");
                return Ok(());
            }
            if state.model.is_loaded() {
                state.mode = EngineMode::Model;
                info!("switched to model mode");
                return Ok(());
            }
            if state.load_attempts != observed_attempts {
                // A load finished while we were queued; report its outcome.
                if let ModelState::FailedToLoad(reason) = &state.model {
                    return Err(SentimentError::ModelLoad(reason.clone()));
                }
            }
        }

        info!("loading classification model");
        let loader = Arc::clone(&self.loader);
        let outcome = match tokio::task::spawn_blocking(move || loader.load()).await {
            Ok(loaded) => loaded,
            Err(e) => Err(anyhow::anyhow!("model loading task failed: {e}")),
        };

        let mut state = self.state.write().await;
        state.load_attempts += 1;

        match outcome {
            Ok(classifier) => {
                let scorer = ModelScorer::new(classifier);
                info!(source = scorer.source(), "model loaded, switched to model mode");
                state.model = ModelState::Loaded(scorer);
                state.mode = EngineMode::Model;
                Ok(())
            }
            Err(e) => {
                let reason = format!("{e:#}");
                error!(error = %reason, "failed to load model, staying in lexicon mode");
                state.model = ModelState::FailedToLoad(reason.clone());
                state.mode = EngineMode::Lexicon;
                Err(SentimentError::ModelLoad(reason))
            }
        }
    }
}

impl std::fmt::Debug for SentimentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentEngine")
            .field("lexicon", &self.lexicon)
            .finish_non_exhaustive()
    }
}
