pub mod core;
pub mod loaders;
pub mod models;
pub mod pipelines;
pub mod server;

// Re-export core types
pub use core::{EngineConfig, SentimentError, SentimentLabel, SentimentResult};

// Re-export the engine for easier access
pub use pipelines::sentiment::{EngineMode, EngineStatus, SentimentEngine, SentimentEngineBuilder};
