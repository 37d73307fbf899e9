//! Sentiment analysis API server.
//!
//! Serves the hybrid engine over HTTP. Starts on the word lexicon unless
//! `USE_ML_MODEL` asks for the DistilBERT classifier up front; the model can be
//! switched on later through `POST /enable-ml-model`.

use anyhow::Result;
use clap::Parser;
use hybrid_sentiment::server::{create_router, AppState};
use hybrid_sentiment::{EngineConfig, SentimentEngineBuilder};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sentiment Analysis API - tells you if text is positive or negative
#[derive(Parser, Debug)]
#[command(name = "hybrid-sentiment", version)]
struct Cli {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = EngineConfig::from_env();
    tracing::info!(
        model_path = %config.model_path.display(),
        use_ml_model = config.use_ml_model,
        "starting sentiment engine"
    );
    let engine = SentimentEngineBuilder::from_config(config).build().await;
    let status = engine.status().await;
    tracing::info!(mode = ?status.mode, model_loaded = status.model_loaded, "engine ready");

    let router = create_router(AppState::new(Arc::new(engine)));

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
