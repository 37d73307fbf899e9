use super::engine::SentimentEngine;
use super::lexicon::{LexiconScorer, WordLexicon};
use super::model::{ModelLoader, SourceModelLoader};
use crate::core::config::{DEFAULT_MODEL_ID, DEFAULT_MODEL_PATH};
use crate::core::EngineConfig;
use crate::pipelines::utils::DeviceRequest;
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for a [`SentimentEngine`].
///
/// Start with `new()` or `from_config(EngineConfig)`, then chain optional settings:
/// - `.model_path(PathBuf)`: Local directory checked for a fine-tuned model.
/// - `.model_id(String)`: Hub repository used when the local directory is absent or empty.
/// - `.use_ml_model(bool)`: Load the model eagerly during `build()`.
/// - `.cpu()` / `.cuda_device(usize)`: Pin model inference to a device.
/// - `.lexicon(WordLexicon)`: Replace the built-in word lists.
/// - `.loader(impl ModelLoader)`: Replace the DistilBERT loader entirely.
///
/// Finally, call `.build().await` to obtain the engine.
pub struct SentimentEngineBuilder {
    model_path: PathBuf,
    model_id: String,
    use_ml_model: bool,
    device_request: DeviceRequest,
    lexicon: Option<WordLexicon>,
    loader: Option<Arc<dyn ModelLoader>>,
}

impl SentimentEngineBuilder {
    pub fn new() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            model_id: DEFAULT_MODEL_ID.to_string(),
            use_ml_model: false,
            device_request: DeviceRequest::Default,
            lexicon: None,
            loader: None,
        }
    }

    pub fn from_config(config: EngineConfig) -> Self {
        let builder = Self::new()
            .model_path(config.model_path)
            .model_id(config.model_id)
            .use_ml_model(config.use_ml_model);
        if config.force_cpu {
            builder.cpu()
        } else {
            builder
        }
    }

    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn model_id(mut self, id: impl Into<String>) -> Self {
        self.model_id = id.into();
        self
    }

    pub fn use_ml_model(mut self, eager: bool) -> Self {
        self.use_ml_model = eager;
        self
    }

    pub fn cpu(mut self) -> Self {
        self.device_request = DeviceRequest::Cpu;
        self
    }

    pub fn cuda_device(mut self, index: usize) -> Self {
        self.device_request = DeviceRequest::Cuda(index);
        self
    }

    pub fn lexicon(mut self, lexicon: WordLexicon) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub fn loader(mut self, loader: impl ModelLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Builds the engine. With `use_ml_model` set, the model is loaded here; a
    /// failed load is logged and the engine comes up in lexicon mode.
    pub async fn build(self) -> SentimentEngine {
        let loader = self.loader.unwrap_or_else(|| {
            Arc::new(SourceModelLoader::new(
                self.model_path,
                self.model_id,
                self.device_request,
            ))
        });
        let lexicon = LexiconScorer::new(self.lexicon.unwrap_or_default());
        let engine = SentimentEngine::new(lexicon, loader);

        if self.use_ml_model {
            if let Err(e) = engine.enable_model_mode().await {
                tracing::warn!(error = %e, "eager model load failed, serving with lexicon");
            }
        }

        engine
    }
}

impl Default for SentimentEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
