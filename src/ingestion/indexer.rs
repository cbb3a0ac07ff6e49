//! The embed-and-upsert loop: one embedding call per batch, records paired
//! positionally, upserted into the configured namespace. A failed batch is
//! logged and skipped; later batches still run. There is no retry — a rerun
//! of the ingest pass overwrites whatever did land, keyed by chunk id.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::embeddings::EmbeddingProvider;
use crate::ingestion::chunk::Chunk;
use crate::stores::{VectorIndex, VectorRecord};

#[derive(Clone, Debug)]
pub struct IndexerConfig {
    pub namespace: String,
    /// Pause between batches, the only rate limiting applied.
    pub batch_delay: Duration,
}

/// Counters for one ingest run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub batches_total: usize,
    pub batches_failed: usize,
    pub records_upserted: usize,
}

pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    config: IndexerConfig,
}

impl Indexer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    /// Runs every batch to completion, logging failures instead of
    /// propagating them.
    pub async fn run(&self, batches: Vec<Vec<Chunk>>) -> IndexReport {
        let mut report = IndexReport {
            batches_total: batches.len(),
            ..IndexReport::default()
        };

        for (number, batch) in batches.into_iter().enumerate() {
            let number = number + 1;
            info!(batch = number, total = report.batches_total, chunks = batch.len(), "embedding batch");

            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let embeddings = match self.embedder.embed_batch(&texts).await {
                Ok(embeddings) => embeddings,
                Err(err) => {
                    error!(batch = number, error = %err, "embedding failed, skipping batch");
                    report.batches_failed += 1;
                    continue;
                }
            };

            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(embeddings)
                .map(|(chunk, values)| VectorRecord::from_chunk(chunk, values))
                .collect();

            match self
                .index
                .upsert(&self.config.namespace, &records)
                .await
            {
                Ok(count) => {
                    info!(batch = number, upserted = count, "batch upserted");
                    report.records_upserted += count;
                }
                Err(err) => {
                    error!(batch = number, error = %err, "upsert failed, skipping batch");
                    report.batches_failed += 1;
                }
            }

            tokio::time::sleep(self.config.batch_delay).await;
        }

        report
    }
}
