use anyhow::Result;
use hybrid_sentiment::pipelines::sentiment::*;

#[tokio::main]
async fn main() -> Result<()> {
    println!("Building engine...");

    let engine = SentimentEngineBuilder::new().cpu().build().await;

    let texts = [
        "I love my new car",
        "This is terrible quality",
        "The weather is nice today",
    ];

    println!("\n=== Lexicon ===");
    for text in texts {
        let result = engine.predict(text).await;
        println!("\"{}\" -> {} (confidence: {:.2})", text, result.label, result.score);
    }

    println!("\nLoading model...");
    engine.enable_model_mode().await?;
    println!("Status: {:?}", engine.status().await);

    println!("\n=== Model ===");
    for text in texts {
        let result = engine.predict(text).await;
        println!("\"{}\" -> {} (confidence: {:.4})", text, result.label, result.score);
    }

    Ok(())
}
