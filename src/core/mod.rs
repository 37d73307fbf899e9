pub mod config;
pub mod error;
pub mod sentiment;

pub use config::EngineConfig;
pub use error::{Result, SentimentError};
pub use sentiment::{SentimentLabel, SentimentResult};
