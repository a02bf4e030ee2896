//! Demo that runs a battery of sample messages through the decision engine
//! (stdout/log only). Uses the remote classifier when CLASSIFIER_ENDPOINT is
//! set, otherwise a fixed fallback distribution.

use std::sync::Arc;

use scam_message_analyzer::{
    DecisionEngine, Distribution, DynTextClassifier, FixedClassifier, RemoteClassifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let classifier: DynTextClassifier = match RemoteClassifier::from_env() {
        Ok(remote) => Arc::new(remote),
        Err(_) => {
            tracing::warn!("CLASSIFIER_ENDPOINT not set; using a fixed fallback distribution");
            Arc::new(FixedClassifier::new(Distribution { safe: 0.7, scam: 0.3 }))
        }
    };
    let engine = DecisionEngine::new(classifier);

    let samples = [
        "FBI warrant arrest immediate payment",
        "You have won $1,000,000! Click here now!",
        "URGENT: IRS tax payment required or face legal action",
        "meeting agenda for tomorrow",
        "Hello, how are you?",
        "The project deadline is next Friday",
    ];

    for text in samples {
        let verdict = engine.classify(text).await?;
        println!("{text}\n  -> {}", serde_json::to_string(&verdict)?);
    }

    println!("analyze-demo done ({})", engine.classifier_name());
    Ok(())
}
