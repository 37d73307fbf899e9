//! Hybrid sentiment classification.
//!
//! Two scorers share one contract, text in and `{label, score}` out:
//!
//! - [`LexiconScorer`] - counts hits in fixed positive/negative word sets; instant, never fails
//! - [`ModelScorer`] - wraps a loaded [`TextClassifier`] (DistilBERT by default) and
//!   normalizes its per-class output
//!
//! [`SentimentEngine`] owns both, tracks the active [`EngineMode`], loads the model
//! on request and falls back to the lexicon whenever the model cannot answer.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use hybrid_sentiment::pipelines::sentiment::*;
//!
//! # async fn run() {
//! let engine = SentimentEngineBuilder::new().build().await;
//!
//! // Lexicon mode until asked otherwise.
//! let result = engine.predict("This is amazing!").await;
//! println!("{} ({:.2})", result.label, result.score);
//!
//! if let Err(e) = engine.enable_model_mode().await {
//!     eprintln!("still on the lexicon: {e}");
//! }
//! println!("{:?}", engine.status().await);
//! # }
//! ```

pub mod builder;
pub mod engine;
pub mod lexicon;
pub mod model;
pub mod scorer;

pub use builder::SentimentEngineBuilder;
pub use engine::{EngineMode, EngineStatus, ModelState, SentimentEngine};
pub use lexicon::{LexiconAnalysis, LexiconScorer, WordLexicon};
pub use model::{ClassScore, ModelLoader, SourceModelLoader, TextClassifier};
pub use scorer::{map_label, ModelScorer};

pub use crate::core::{SentimentError, SentimentLabel, SentimentResult};
