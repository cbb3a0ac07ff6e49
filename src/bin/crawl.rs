//! Crawls the wiki category tree and writes the feature map
//! (category → article URLs) used by the scrape pass.

use url::Url;

use oresmith::config::{self, IngestSettings, PathSettings};
use oresmith::crawl::CategoryCrawler;
use oresmith::ingestion::store::{self, FeatureMap};
use oresmith::types::RagError;

const CATEGORY_SEEDS: [(&str, &str); 6] = [
    ("blocks", "https://minecraft.wiki/w/Category:Blocks"),
    ("items", "https://minecraft.wiki/w/Category:Items"),
    ("entities", "https://minecraft.wiki/w/Category:Entities"),
    ("mobs", "https://minecraft.wiki/w/Category:Mobs"),
    ("biomes", "https://minecraft.wiki/w/Category:Biomes"),
    ("gameplay", "https://minecraft.wiki/w/Category:Gameplay"),
];

/// `CRAWL_SEEDS=name=url,name=url` replaces the default category map, e.g.
/// a single `java=https://minecraft.wiki/w/Category:Java_Edition` seed.
fn seeds_from_env() -> Result<Vec<(String, String)>, RagError> {
    let Ok(raw) = std::env::var("CRAWL_SEEDS") else {
        return Ok(CATEGORY_SEEDS
            .iter()
            .map(|(name, url)| (name.to_string(), url.to_string()))
            .collect());
    };
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(name, url)| (name.trim().to_string(), url.trim().to_string()))
                .ok_or_else(|| {
                    RagError::Config(format!("CRAWL_SEEDS entry '{entry}' is not name=url"))
                })
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), RagError> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let paths = PathSettings::from_env();
    let ingest = IngestSettings::from_env()?;
    let client = config::http_client()?;
    let crawler = CategoryCrawler::new(client, ingest.crawl_delay)?;

    let mut features = FeatureMap::new();
    for (category, seed) in seeds_from_env()? {
        println!("Crawling category: {category}");
        let seed = Url::parse(&seed).map_err(|err| RagError::Config(err.to_string()))?;
        let outcome = crawler.crawl(&seed).await;
        println!(
            "  {category}: {} pages found ({} category pages visited, {} fetch failures)",
            outcome.articles.len(),
            outcome.pages_visited,
            outcome.fetch_failures
        );
        features.insert(
            category,
            outcome.articles.iter().map(Url::to_string).collect(),
        );
    }

    store::save_features(&paths.features_file, &features).await?;
    println!("Saved feature map to {}", paths.features_file.display());
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
