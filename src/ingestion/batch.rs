//! Groups chunks into batches that fit one embedding request.

use tracing::warn;

use crate::ingestion::chunk::{Chunk, Chunker};

/// Greedy batch packing under a total token budget per batch.
#[derive(Clone, Debug)]
pub struct Batcher {
    max_tokens: usize,
}

impl Batcher {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    /// Splits `chunks` into ordered batches whose summed token counts stay
    /// within the budget. A single chunk that alone exceeds the budget is
    /// isolated into its own batch and logged, never dropped.
    pub fn split(&self, chunks: Vec<Chunk>, chunker: &Chunker) -> Vec<Vec<Chunk>> {
        let mut batches = Vec::new();
        let mut current = Vec::new();
        let mut current_tokens = 0;

        for chunk in chunks {
            let tokens = chunker.count_tokens(&chunk.text);

            if current_tokens + tokens > self.max_tokens && !current.is_empty() {
                batches.push(std::mem::take(&mut current));
                current_tokens = 0;
            }

            if tokens > self.max_tokens {
                warn!(id = %chunk.id, tokens, budget = self.max_tokens, "oversized chunk isolated into its own batch");
                batches.push(vec![chunk]);
                continue;
            }

            current_tokens += tokens;
            current.push(chunk);
        }

        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }
}
