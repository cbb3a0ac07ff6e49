//! Persisted document collection and the incremental merge pass.
//!
//! The store is a single JSON file of [`Document`] records. A merge pass
//! loads the existing collection, skips URLs it already holds, extracts the
//! rest, and writes `existing + new` back in one shot at the end — a crash
//! mid-run loses in-progress documents but never corrupts what was already
//! persisted.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use tracing::{info, warn};
use url::Url;

use crate::extract::ArticleExtractor;
use crate::types::{Document, RagError};

/// Category name → article URLs, as written by the crawler.
pub type FeatureMap = BTreeMap<String, Vec<String>>;

pub async fn load_features(path: impl AsRef<Path>) -> Result<FeatureMap, RagError> {
    let data = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&data)?)
}

pub async fn save_features(
    path: impl AsRef<Path>,
    features: &FeatureMap,
) -> Result<(), RagError> {
    write_json(path.as_ref(), features).await
}

/// JSON-file-backed collection of extracted documents.
#[derive(Clone, Debug)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted collection; an absent file is an empty collection.
    pub async fn load(&self) -> Result<Vec<Document>, RagError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&data)?)
    }

    pub async fn save(&self, documents: &[Document]) -> Result<(), RagError> {
        write_json(&self.path, &documents).await
    }
}

/// Summary of one merge pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub new_documents: usize,
    pub skipped_known: usize,
    pub failed: usize,
    pub total: usize,
}

/// Extracts every feature URL not already in the store and persists the
/// merged collection.
pub async fn merge_documents(
    store: &DocumentStore,
    features: &FeatureMap,
    extractor: &ArticleExtractor,
    delay: Duration,
) -> Result<MergeReport, RagError> {
    let mut documents = store.load().await?;
    let mut known: HashSet<String> = documents.iter().map(|doc| doc.url.clone()).collect();
    info!(existing = documents.len(), "loaded document store");

    let mut report = MergeReport::default();

    for (category, urls) in features {
        info!(category = %category, urls = urls.len(), "scraping category");
        for raw in urls {
            if known.contains(raw) {
                report.skipped_known += 1;
                continue;
            }

            let url = match Url::parse(raw) {
                Ok(url) => url,
                Err(err) => {
                    warn!(url = %raw, error = %err, "unparseable feature URL, skipping");
                    report.failed += 1;
                    continue;
                }
            };

            tokio::time::sleep(delay).await;
            match extractor.extract(&url).await? {
                Some(doc) => {
                    known.insert(doc.url.clone());
                    documents.push(doc.with_category(category.clone()));
                    report.new_documents += 1;
                }
                None => report.failed += 1,
            }
        }
    }

    store.save(&documents).await?;
    report.total = documents.len();
    info!(
        new = report.new_documents,
        skipped = report.skipped_known,
        failed = report.failed,
        total = report.total,
        "merge pass complete"
    );
    Ok(report)
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), RagError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized).await?;
    Ok(())
}
