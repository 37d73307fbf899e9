use crate::loaders::ModelSource;
use crate::models::DistilBertClassifier;
use crate::pipelines::utils::DeviceRequest;
use std::path::PathBuf;
use std::sync::Arc;

/// One class of a classifier's output with its native label.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScore {
    pub label: String,
    pub score: f32,
}

/// A loaded text-classification model producing per-class scores.
pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str) -> anyhow::Result<Vec<ClassScore>>;

    /// Human-readable description of where the model came from.
    fn source(&self) -> &str;
}

/// Produces a [`TextClassifier`]. Called at most once per successful load.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> anyhow::Result<Arc<dyn TextClassifier>>;
}

/// Default loader: local fine-tuned directory if present, hub checkpoint otherwise.
#[derive(Debug, Clone)]
pub struct SourceModelLoader {
    model_path: PathBuf,
    model_id: String,
    device_request: DeviceRequest,
}

impl SourceModelLoader {
    pub fn new(
        model_path: impl Into<PathBuf>,
        model_id: impl Into<String>,
        device_request: DeviceRequest,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            model_id: model_id.into(),
            device_request,
        }
    }

    /// Resolved lazily so a directory created after startup is still picked up.
    pub fn source(&self) -> ModelSource {
        ModelSource::resolve(&self.model_path, &self.model_id)
    }
}

impl ModelLoader for SourceModelLoader {
    fn load(&self) -> anyhow::Result<Arc<dyn TextClassifier>> {
        let source = self.source();
        tracing::info!(%source, "loading sentiment classifier");

        let device = self.device_request.resolve()?;
        let classifier = DistilBertClassifier::load(&source, device)?;

        Ok(Arc::new(classifier))
    }
}
