//! Interactive question answering: one question in, one grounded answer out.

use std::io::Write;
use std::sync::Arc;

use oresmith::completions::OpenAiCompletionProvider;
use oresmith::config::{self, Settings};
use oresmith::embeddings::OpenAiEmbeddingProvider;
use oresmith::query::{QueryConfig, QueryService};
use oresmith::stores::PineconeIndex;
use oresmith::types::RagError;

#[tokio::main]
async fn main() -> Result<(), RagError> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env()?;
    let client = config::http_client()?;

    let embedder = Arc::new(OpenAiEmbeddingProvider::new(
        client.clone(),
        &settings.openai.base_url,
        &settings.openai.api_key,
        &settings.openai.embed_model,
    ));
    let index = Arc::new(PineconeIndex::new(
        client.clone(),
        &settings.index.host,
        &settings.index.api_key,
    ));
    let completions = Arc::new(OpenAiCompletionProvider::new(
        client,
        &settings.openai.base_url,
        &settings.openai.api_key,
        &settings.openai.response_model,
    ));

    let service = QueryService::new(
        embedder,
        index,
        completions,
        QueryConfig {
            namespace: settings.index.namespace.clone(),
            top_k: settings.top_k,
            ..QueryConfig::default()
        },
    );

    print!("Ask a question about minecraft: ");
    std::io::stdout().flush()?;
    let mut question = String::new();
    std::io::stdin().read_line(&mut question)?;
    let question = question.trim();
    if question.is_empty() {
        println!("No question given.");
        return Ok(());
    }

    println!("Finding relevant articles and generating your answer...\n");
    let answer = service.answer(question).await?;
    println!("{answer}");
    Ok(())
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
