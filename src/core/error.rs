use thiserror::Error;

/// Errors surfaced by the sentiment scorers and the engine controller.
///
/// `ModelUnavailable` and `Inference` never leave [`SentimentEngine::predict`]:
/// the engine answers those calls from the lexicon instead. `ModelLoad` is
/// reported to whoever asked for model mode.
///
/// [`SentimentEngine::predict`]: crate::pipelines::sentiment::SentimentEngine::predict
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SentimentError {
    /// Model-mode prediction was attempted without a loaded classifier.
    #[error("no classification model is loaded")]
    ModelUnavailable,

    /// The loaded classifier failed while scoring a text.
    #[error("model inference failed: {0}")]
    Inference(String),

    /// The classifier could not be loaded (network, bad identifier, corrupt artifact).
    #[error("{0}")]
    ModelLoad(String),
}

pub type Result<T> = std::result::Result<T, SentimentError>;
