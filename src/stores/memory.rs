//! In-process vector index with the same upsert/query semantics as the
//! hosted one: ids overwrite, queries rank by cosine similarity.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{IndexStats, QueryMatch, RecordMetadata, VectorIndex, VectorRecord};
use crate::types::RagError;

#[derive(Default)]
pub struct MemoryIndex {
    namespaces: Mutex<HashMap<String, HashMap<String, VectorRecord>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored metadata for one record, if present.
    pub fn metadata(&self, namespace: &str, id: &str) -> Option<RecordMetadata> {
        let namespaces = self.namespaces.lock();
        namespaces
            .get(namespace)
            .and_then(|records| records.get(id))
            .map(|record| record.metadata.clone())
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<usize, RagError> {
        let mut namespaces = self.namespaces.lock();
        let entries = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            entries.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, RagError> {
        let namespaces = self.namespaces.lock();
        let Some(records) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<QueryMatch> = records
            .values()
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.values),
                metadata: Some(record.metadata.clone()),
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn describe_index_stats(&self) -> Result<IndexStats, RagError> {
        let namespaces = self.namespaces.lock();
        let counts: BTreeMap<String, usize> = namespaces
            .iter()
            .map(|(name, records)| (name.clone(), records.len()))
            .collect();
        let dimension = namespaces
            .values()
            .flat_map(HashMap::values)
            .next()
            .map(|record| record.values.len());
        Ok(IndexStats {
            dimension,
            total_vector_count: counts.values().sum(),
            namespaces: counts,
        })
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, values: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            values,
            metadata: RecordMetadata {
                title: "Stone".to_string(),
                text: format!("text for {id}"),
                category: "blocks".to_string(),
                document_url: "https://minecraft.wiki/w/Stone".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_id() {
        let index = MemoryIndex::new();
        index
            .upsert("wiki", &[record("a", vec![1.0, 0.0])])
            .await
            .unwrap();
        index
            .upsert("wiki", &[record("a", vec![0.0, 1.0])])
            .await
            .unwrap();

        let stats = index.describe_index_stats().await.unwrap();
        assert_eq!(stats.total_vector_count, 1);

        // Latest vector wins: the record now matches the second direction.
        let matches = index.query("wiki", &[0.0, 1.0], 1).await.unwrap();
        assert_eq!(matches[0].id, "a");
        assert!((matches[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn query_ranks_by_similarity_and_truncates() {
        let index = MemoryIndex::new();
        index
            .upsert(
                "wiki",
                &[
                    record("north", vec![0.0, 1.0]),
                    record("east", vec![1.0, 0.0]),
                    record("northeast", vec![1.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let matches = index.query("wiki", &[0.0, 1.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "north");
        assert_eq!(matches[1].id, "northeast");
        assert!(matches[0].metadata.is_some());
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let index = MemoryIndex::new();
        index
            .upsert("wiki", &[record("a", vec![1.0, 0.0])])
            .await
            .unwrap();

        let matches = index.query("recipes", &[1.0, 0.0], 5).await.unwrap();
        assert!(matches.is_empty());
    }
}
