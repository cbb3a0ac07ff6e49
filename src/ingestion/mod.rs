//! Ingestion: turning crawled pages into an embedded, queryable corpus.
//!
//! * [`store`] — the persisted document collection and its merge pass.
//! * [`chunk`] — splitting document text into overlapping bounded segments.
//! * [`batch`] — grouping chunks under a per-request token budget.
//! * [`indexer`] — the embed-and-upsert loop against the vector index.
//! * [`recipes`] — supplemental crafting-recipe documents.

pub mod batch;
pub mod chunk;
pub mod indexer;
pub mod recipes;
pub mod store;

pub use batch::Batcher;
pub use chunk::{Chunk, Chunker, ChunkerConfig};
pub use indexer::{IndexReport, Indexer, IndexerConfig};
pub use store::{DocumentStore, FeatureMap, MergeReport};
