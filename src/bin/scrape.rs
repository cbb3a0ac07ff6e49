//! Extracts every feature URL not already in the document store and
//! persists the merged collection.

use oresmith::config::{self, IngestSettings, PathSettings};
use oresmith::extract::ArticleExtractor;
use oresmith::ingestion::store::{self, DocumentStore};
use oresmith::types::RagError;

#[tokio::main]
async fn main() -> Result<(), RagError> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let paths = PathSettings::from_env();
    let ingest = IngestSettings::from_env()?;
    let client = config::http_client()?;
    let extractor = ArticleExtractor::new(client)?;
    let doc_store = DocumentStore::new(&paths.documents_file);

    let features = store::load_features(&paths.features_file).await?;
    let categories = features.len();
    let urls: usize = features.values().map(Vec::len).sum();
    println!("Loaded {urls} feature URLs across {categories} categories");

    let report =
        store::merge_documents(&doc_store, &features, &extractor, ingest.crawl_delay).await?;

    println!("Done.");
    println!("  new documents : {}", report.new_documents);
    println!("  already known : {}", report.skipped_known);
    println!("  failed        : {}", report.failed);
    println!(
        "  total saved   : {} in {}",
        report.total,
        doc_store.path().display()
    );
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
