//! Retrieval-augmented question answering over Minecraft wiki content.
//!
//! ```text
//! Category seeds ──► crawl::CategoryCrawler ──► feature map (JSON)
//!                                                     │
//! feature map ──► extract::ArticleExtractor ──► ingestion::store (documents.json)
//!                                                     │
//! documents ──► ingestion::chunk ──► ingestion::batch ──► ingestion::indexer
//!                                                     │
//!                       embeddings::EmbeddingProvider ─┴─► stores::VectorIndex
//!
//! question ──► query::QueryService (embed ► retrieve ► prompt) ──► answer
//! ```
//!
//! Every non-trivial capability is delegated to hosted services behind
//! narrow traits: [`embeddings::EmbeddingProvider`],
//! [`completions::CompletionProvider`], and [`stores::VectorIndex`].
//! Execution is sequential with polite fixed delays; branch-local failures
//! are logged and skipped, and reruns stay idempotent through URL-keyed
//! document dedup and id-keyed vector upserts.

pub mod completions;
pub mod config;
pub mod crawl;
pub mod embeddings;
pub mod extract;
pub mod ingestion;
pub mod query;
pub mod stores;
pub mod types;

pub use crawl::CategoryCrawler;
pub use extract::ArticleExtractor;
pub use ingestion::{Batcher, Chunk, Chunker, ChunkerConfig, DocumentStore, Indexer};
pub use query::{QueryConfig, QueryService};
pub use types::{Document, RagError};
