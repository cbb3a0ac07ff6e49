//! Vector index backends.
//!
//! [`VectorIndex`] is the narrow contract the pipeline holds against the
//! hosted vector database: upsert records into a namespace, query top-k by
//! similarity, read index stats. [`pinecone`] talks to the hosted data
//! plane; [`memory`] is an in-process index for tests and offline runs.

pub mod memory;
pub mod pinecone;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ingestion::chunk::Chunk;
use crate::types::RagError;

pub use memory::MemoryIndex;
pub use pinecone::{PineconeIndex, TextRecord};

/// Metadata stored alongside every vector, enough to rebuild a context
/// passage without fetching the source document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecordMetadata {
    pub title: String,
    pub text: String,
    pub category: String,
    pub document_url: String,
}

/// One upsertable vector. Ids derive deterministically from the source
/// chunk, so re-upserting overwrites instead of duplicating.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

impl VectorRecord {
    pub fn from_chunk(chunk: &Chunk, values: Vec<f32>) -> Self {
        Self {
            id: chunk.id.clone(),
            values,
            metadata: RecordMetadata {
                title: chunk.title.clone(),
                text: chunk.text.clone(),
                category: chunk.category.clone(),
                document_url: chunk.document_url.clone(),
            },
        }
    }
}

/// One ranked query hit.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<RecordMetadata>,
}

/// Snapshot of index occupancy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexStats {
    pub dimension: Option<usize>,
    pub total_vector_count: usize,
    /// Vector count per namespace.
    pub namespaces: BTreeMap<String, usize>,
}

/// The pipeline's contract with the vector database.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts or overwrites records in a namespace, returning how many the
    /// index accepted.
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<usize, RagError>;

    /// Returns the `top_k` records nearest to `vector`, most similar first,
    /// with stored metadata included.
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, RagError>;

    async fn describe_index_stats(&self) -> Result<IndexStats, RagError>;
}
