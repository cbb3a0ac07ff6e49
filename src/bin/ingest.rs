//! Chunks the document store, embeds each token-safe batch, and upserts
//! the vectors into the hosted index.

use std::sync::Arc;

use oresmith::config::{self, Settings};
use oresmith::embeddings::OpenAiEmbeddingProvider;
use oresmith::ingestion::indexer::{Indexer, IndexerConfig};
use oresmith::ingestion::store::DocumentStore;
use oresmith::ingestion::{Batcher, Chunker, recipes};
use oresmith::stores::{PineconeIndex, VectorIndex};
use oresmith::types::RagError;

#[tokio::main]
async fn main() -> Result<(), RagError> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env()?;
    let client = config::http_client()?;

    println!("Loading documents...");
    let store = DocumentStore::new(&settings.paths.documents_file);
    let mut documents = store.load().await?;
    println!("  {} scraped documents", documents.len());

    let recipe_docs =
        recipes::recipes_to_documents(&recipes::load_recipes(&settings.paths.recipes_dir).await?);
    if !recipe_docs.is_empty() {
        println!("  {} recipe documents", recipe_docs.len());
        documents.extend(recipe_docs);
    }

    println!("Chunking...");
    let chunker = Chunker::new(settings.ingest.chunker.clone())?;
    let chunks = chunker.chunk_documents(&documents)?;
    println!("  {} chunks", chunks.len());

    let batches = Batcher::new(settings.ingest.max_batch_tokens).split(chunks, &chunker);
    println!("  {} token-safe batches", batches.len());

    let embedder = Arc::new(OpenAiEmbeddingProvider::new(
        client.clone(),
        &settings.openai.base_url,
        &settings.openai.api_key,
        &settings.openai.embed_model,
    ));
    let index = Arc::new(PineconeIndex::new(
        client,
        &settings.index.host,
        &settings.index.api_key,
    ));

    println!("Embedding and upserting...");
    let indexer = Indexer::new(
        embedder,
        index.clone(),
        IndexerConfig {
            namespace: settings.index.namespace.clone(),
            batch_delay: settings.ingest.batch_delay,
        },
    );
    let report = indexer.run(batches).await;

    println!("Done.");
    println!("  batches        : {}", report.batches_total);
    println!("  failed batches : {}", report.batches_failed);
    println!("  records upsert : {}", report.records_upserted);

    match index.describe_index_stats().await {
        Ok(stats) => println!(
            "Index now holds {} vectors across {} namespaces",
            stats.total_vector_count,
            stats.namespaces.len()
        ),
        Err(err) => eprintln!("Could not read index stats: {err}"),
    }
    Ok(())
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
