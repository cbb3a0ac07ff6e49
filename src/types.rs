//! Crate-wide error type and the core document record.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the ingestion and query pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    /// An HTTP request failed before a response could be read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem access failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A page or selector did not have the expected structure.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Splitting a document into chunks failed.
    #[error("chunking failed: {0}")]
    Chunking(String),

    /// The embedding service rejected a request or returned a bad payload.
    #[error("embedding service error: {0}")]
    Embedding(String),

    /// The vector index rejected a request or returned a bad payload.
    #[error("vector index error: {0}")]
    Index(String),

    /// The completion service rejected a request or returned a bad payload.
    #[error("completion service error: {0}")]
    Completion(String),

    /// A required setting is missing or unparseable.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A scraped wiki article, deduplicated across runs by `url`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "miscellaneous".to_string()
}

impl Document {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
            category: default_category(),
        }
    }

    /// Tags the document with the category listing it was discovered under.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}
