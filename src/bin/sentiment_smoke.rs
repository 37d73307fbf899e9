//! Smoke test against a running sentiment server.
//!
//! Posts a handful of canonical phrases to `/predict` and prints one line per
//! phrase. Exits non-zero if any request or response fails.

use anyhow::{Context, Result};
use clap::Parser;
use hybrid_sentiment::SentimentResult;
use std::process::ExitCode;
use std::time::Duration;

const TEST_CASES: &[&str] = &[
    "This is amazing!",
    "I hate this product",
    "The weather is nice today",
    "This is terrible quality",
];

#[derive(Parser, Debug)]
#[command(name = "sentiment-smoke", about = "Simple API test for the sentiment server")]
struct Cli {
    /// Base URL of the server
    #[arg(long, default_value = "http://localhost:8000")]
    url: String,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .timeout_global(Some(Duration::from_secs(30)))
        .build()
        .new_agent()
}

fn predict(agent: &ureq::Agent, base_url: &str, text: &str) -> Result<SentimentResult> {
    let url = format!("{}/predict", base_url.trim_end_matches('/'));
    let mut response = agent
        .post(&url)
        .send_json(serde_json::json!({ "text": text }))
        .with_context(|| format!("request to {url} failed"))?;

    response
        .body_mut()
        .read_json::<SentimentResult>()
        .context("could not parse prediction response")
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let agent = make_agent();

    println!("Testing API...");
    let mut failures = 0;
    for text in TEST_CASES {
        match predict(&agent, &cli.url, text) {
            Ok(result) => println!("'{text}' -> {} ({:.3})", result.label, result.score),
            Err(e) => {
                failures += 1;
                println!("'{text}' -> error: {e:#}");
            }
        }
    }

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
